use crate::anomaly::classify;
use crate::error::AnalyticsError;
use crate::report::AnalysisReport;
use crate::similarity::find_similar_events;
use crate::statistics::compute_statistics;
use crate::volatility::{analyze_volatility, forecast_volatility};
use configuration::{AnalysisConfig, DetectionMethod};
use core_types::{validate_series, DataPoint};
use tracing::{info, instrument, warn};

/// Runs every analysis over one series.
///
/// The last point is the current observation; everything before it is its history.
/// The similarity search uses the trailing `window_size` points as the current window
/// and the whole series as history.
///
/// Log-returns do not exist for a series with levels at or below zero. Such a series is
/// classified by plain Z-score and its report carries no volatility or forecast.
#[instrument(skip(points, config), fields(points = points.len()))]
pub fn analyze_series(
    series_id: &str,
    points: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalyticsError> {
    config.validate()?;
    let Some((current, history)) = points.split_last() else {
        return Err(AnalyticsError::InvalidInput(
            "a series needs at least two observations to analyze".to_string(),
        ));
    };
    if history.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "a series needs at least two observations to analyze".to_string(),
        ));
    }
    validate_series(points)?;

    let statistics = compute_statistics(points)?;

    let (anomaly, volatility, forecast) = if points.iter().all(|p| p.value > 0.0) {
        (
            classify(series_id, current.value, history, config)?,
            Some(analyze_volatility(current.value, history, config)?),
            Some(forecast_volatility(points, config)?),
        )
    } else {
        warn!(
            series_id,
            "Series has non-positive levels; classifying by Z-score and skipping volatility analytics."
        );
        let zscore = AnalysisConfig {
            method: DetectionMethod::ZScore,
            ..config.clone()
        };
        (classify(series_id, current.value, history, &zscore)?, None, None)
    };

    let similar_events = if points.len() >= config.window_size {
        let current_window = &points[points.len() - config.window_size..];
        find_similar_events(current_window, points, config)?
    } else {
        warn!(
            series_id,
            have = points.len(),
            window_size = config.window_size,
            "Series shorter than the similarity window; no events."
        );
        Vec::new()
    };

    info!(
        series_id,
        severity = %anomaly.severity,
        events = similar_events.len(),
        "Series analysis complete."
    );

    Ok(AnalysisReport {
        series_id: series_id.to_string(),
        as_of: current.date,
        statistics,
        anomaly,
        volatility,
        forecast,
        similar_events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{Analyzer, Severity};

    fn series(vals: &[f64]) -> Vec<DataPoint> {
        let start = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        vals.iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(start + chrono::Days::new(i as u64), *v))
            .collect()
    }

    #[test]
    fn splits_current_from_history() {
        let levels: Vec<f64> = (0..61).map(|i| 5.0 + i as f64 * 0.01).collect();
        let points = series(&levels);
        let report = analyze_series("RAMP", &points, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.as_of, points[60].date);
        assert_eq!(report.anomaly.current_value, levels[60]);
        assert_eq!(report.anomaly.severity, Severity::Normal);
        assert_eq!(report.statistics.count, 61);
        assert!(report.volatility.is_some());
        assert!(report.forecast.as_ref().is_some_and(|f| f.sufficient_data));
    }

    #[test]
    fn short_series_has_no_events() {
        let points = series(&[1.0, 2.0, 3.0]);
        let report = analyze_series("S", &points, &AnalysisConfig::default()).unwrap();
        assert!(report.similar_events.is_empty());
        assert_eq!(report.anomaly.confidence, 0.0);
    }

    #[test]
    fn non_positive_series_skips_volatility_in_zscore_mode() {
        let points = series(&[-1.0, 0.5, -0.25, 0.0, 1.5]);
        let config = AnalysisConfig {
            method: DetectionMethod::ZScore,
            ..Default::default()
        };
        let report = analyze_series("SPREAD", &points, &config).unwrap();
        assert!(report.volatility.is_none());
        assert!(report.forecast.is_none());
    }

    #[test]
    fn non_positive_series_falls_back_to_zscore_by_default() {
        let levels: Vec<f64> = (0..80).map(|i| (i as f64 * 0.3).sin()).collect();
        let points = series(&levels);
        let report = analyze_series("SPREAD", &points, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.anomaly.analyzer, Analyzer::ZScore);
        assert_eq!(report.anomaly.current_value, levels[79]);
        assert!(report.anomaly.confidence > 0.0);
        assert!(report.volatility.is_none());
        assert!(report.forecast.is_none());
        assert_eq!(report.statistics.count, 80);
        assert!(!report.similar_events.is_empty());
    }

    #[test]
    fn rejects_single_point_and_empty_input() {
        let config = AnalysisConfig::default();
        assert!(analyze_series("S", &[], &config).is_err());
        assert!(analyze_series("S", &series(&[1.0]), &config).is_err());
    }
}
