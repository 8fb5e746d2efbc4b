//! # Econlens Analytics Engine
//!
//! This crate turns ordered indicator observations into three kinds of derived analytics:
//! anomaly classification of the newest observation, conditional (time-varying)
//! volatility estimates, and a search for historical windows shaped like the current trend.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of where the
//!   observations come from or where the results go. It depends only on `core-types`
//!   and `configuration` (Layer 0).
//! - **Stateless Calculation:** Every public operation is a free function over explicit
//!   inputs and an `AnalysisConfig`. Nothing is cached and nothing is shared between
//!   calls, so callers may analyze any number of series in parallel.
//! - **Typed degradation:** Invalid input is an `Err`. Too little data or degenerate
//!   numbers are not: they produce a well-formed, low-confidence or empty result.
//!
//! ## Public API
//!
//! - `compute_statistics`: descriptive statistics of a sequence.
//! - `classify`: anomaly classification of a current value against its history.
//! - `estimate_conditional_volatility`, `analyze_volatility`, `forecast_volatility`.
//! - `find_similar_events`: historical similarity search.
//! - `analyze_series`: everything above for one series, bundled in an `AnalysisReport`.

// Declare the modules that constitute this crate.
pub mod anomaly;
pub mod engine;
pub mod error;
pub mod narrative;
pub mod report;
pub mod returns;
pub mod similarity;
pub mod statistics;
pub mod volatility;

// Re-export the key components to create a clean, public-facing API.
pub use anomaly::{classify, classify_severity, compare_methods, AnomalyResult, MethodComparison};
pub use engine::analyze_series;
pub use error::AnalyticsError;
pub use report::AnalysisReport;
pub use similarity::{find_similar_events, similarity_score, HistoricalSimilarEvent};
pub use statistics::{compute_statistics, z_scores, StatisticsSummary};
pub use volatility::{
    analyze_volatility, estimate_conditional_volatility, forecast_volatility,
    ConditionalVolatility, ForecastTrend, VolatilityAnalysisResult, VolatilityForecast,
};
