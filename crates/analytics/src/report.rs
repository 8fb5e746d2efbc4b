use crate::anomaly::AnomalyResult;
use crate::similarity::HistoricalSimilarEvent;
use crate::statistics::StatisticsSummary;
use crate::volatility::{VolatilityAnalysisResult, VolatilityForecast};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Every analysis of one series, as produced by `analyze_series`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub series_id: String,
    /// Date of the observation treated as current.
    pub as_of: NaiveDate,
    pub statistics: StatisticsSummary,
    pub anomaly: AnomalyResult,
    /// `None` when the series has non-positive levels, where log-returns do not exist.
    pub volatility: Option<VolatilityAnalysisResult>,
    pub forecast: Option<VolatilityForecast>,
    pub similar_events: Vec<HistoricalSimilarEvent>,
}
