//! # Econlens Core Types
//!
//! Layer 0 of the workspace: the plain data structures shared by every other crate.
//! Nothing here performs analysis; it only describes observations and the labels
//! attached to analytical results, plus the checks every observation sequence must pass
//! before it is allowed into the engine.

pub mod enums;
pub mod error;
pub mod series;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Analyzer, Locale, Severity, VolatilityRegime};
pub use error::CoreError;
pub use series::{slice_by_date, validate_series, values};
pub use structs::DataPoint;
