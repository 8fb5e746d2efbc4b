//! # Econlens Reporter
//!
//! Layer 2 of the workspace: turns the result structures of the `analytics` crate into
//! something a person reads.
//!
//! ## Architectural Principles
//!
//! - **Pure formatting:** Nothing here recomputes or reclassifies. The same result renders
//!   to the same text every time, in either locale.
//! - **Display rounding only:** Values reach this crate at full precision and are rounded
//!   only when written out.
//!
//! ## Public API
//!
//! - `text::format_*`: localized plain-text renderings of every result type.
//! - `events_table`: similar events as a terminal or Markdown table.
//! - `render_json`: pretty-printed JSON of any result.

use crate::error::ReportError;
use serde::Serialize;

pub mod error;
pub mod table;
pub mod text;

pub use table::{events_table, TableStyle};
pub use text::{
    format_analysis_sections, format_anomaly, format_comparison, format_forecast, format_full_report,
    format_similar_events, format_statistics, format_volatility, no_events_message,
};

/// Pretty-printed JSON for any serializable result.
pub fn render_json<T: Serialize>(value: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(value)?)
}
