use crate::error::AnalyticsError;
use crate::narrative;
use crate::statistics::{mean_std, z_score};
use crate::volatility::{confidence_score, fit_with_current, value_at_risk, MIN_RETURNS};
use configuration::{AnalysisConfig, DetectionMethod, VolatilityModel};
use core_types::{validate_series, values, Analyzer, DataPoint, Severity};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Classification of one current observation against its history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub series_id: String,
    pub current_value: f64,
    pub z_score: f64,
    /// Conditional volatility of returns (in %) or, in plain Z-score mode, the
    /// standard deviation of the reference levels.
    pub conditional_volatility: f64,
    pub persistence: f64,
    pub half_life: f64,
    pub long_run_variance: f64,
    pub severity: Severity,
    pub is_anomaly: bool,
    /// 0 to 100, grows with the amount of history behind the estimate.
    pub confidence: f64,
    pub explanation: String,
    pub analyzer: Analyzer,
    pub value_at_risk: f64,
    pub confidence_level: f64,
    pub sample_size: usize,
}

/// Maps `|z|` onto a severity tier. Monotonic in `|z|`.
pub fn classify_severity(z_score: f64, warning_z: f64, critical_z: f64) -> Severity {
    let magnitude = z_score.abs();
    if magnitude >= critical_z {
        Severity::Critical
    } else if magnitude >= warning_z {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

fn analyzer_for(model: &VolatilityModel) -> Analyzer {
    match model {
        VolatilityModel::Ewma { .. } => Analyzer::Ewma,
        VolatilityModel::Garch11 { .. } => Analyzer::Garch11,
    }
}

/// Classifies `current_value` against `history` with the method selected in `config`.
///
/// # Arguments
///
/// * `series_id` - Echoed into the result.
/// * `current_value` - The observation to classify. It is not part of `history`.
/// * `history` - Earlier observations, sorted ascending by date.
/// * `config` - Thresholds, estimator choice and output locale.
///
/// # Returns
///
/// An error for invalid input. Too little history is not an error: the result then has
/// `confidence == 0`, `severity == Normal` and zeroed volatility fields.
#[instrument(skip(history, config), fields(points = history.len(), method = ?config.method))]
pub fn classify(
    series_id: &str,
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<AnomalyResult, AnalyticsError> {
    match config.method {
        DetectionMethod::ZScore => classify_zscore(series_id, current_value, history, config),
        DetectionMethod::ConditionalVolatility => {
            classify_conditional(series_id, current_value, history, config)
        }
    }
}

fn classify_zscore(
    series_id: &str,
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<AnomalyResult, AnalyticsError> {
    config.validate()?;
    if history.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "history must contain at least one observation".to_string(),
        ));
    }
    if !current_value.is_finite() {
        return Err(AnalyticsError::InvalidInput(format!(
            "current value must be finite, got {current_value}"
        )));
    }
    validate_series(history)?;

    let start = history.len().saturating_sub(config.zscore_window);
    let reference = values(&history[start..]);
    let (mean, std_dev) = mean_std(&reference);
    let z = z_score(current_value, mean, std_dev);
    if std_dev <= 0.0 {
        tracing::warn!(series_id, "Reference window has zero variance; Z-score forced to 0.");
    }

    let severity = classify_severity(z, config.warning_z, config.critical_z);
    let sample_size = reference.len();
    let confidence = (sample_size as f64 / config.zscore_window as f64 * 100.0).min(100.0);

    Ok(AnomalyResult {
        series_id: series_id.to_string(),
        current_value,
        z_score: z,
        conditional_volatility: std_dev,
        persistence: 0.0,
        half_life: 0.0,
        long_run_variance: std_dev * std_dev,
        severity,
        is_anomaly: z.abs() >= config.warning_z,
        confidence,
        explanation: narrative::anomaly_explanation(
            config.locale,
            Analyzer::ZScore,
            severity,
            current_value,
            z,
            std_dev,
        ),
        analyzer: Analyzer::ZScore,
        value_at_risk: 0.0,
        confidence_level: config.confidence_level,
        sample_size,
    })
}

fn classify_conditional(
    series_id: &str,
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<AnomalyResult, AnalyticsError> {
    let model = config.volatility_model();
    let analyzer = analyzer_for(&model);

    let Some(fitted) = fit_with_current(current_value, history, config)? else {
        let have = history.len().saturating_sub(1);
        return Ok(AnomalyResult {
            series_id: series_id.to_string(),
            current_value,
            z_score: 0.0,
            conditional_volatility: 0.0,
            persistence: 0.0,
            half_life: 0.0,
            long_run_variance: 0.0,
            severity: Severity::Normal,
            is_anomaly: false,
            confidence: 0.0,
            explanation: narrative::insufficient_data_explanation(config.locale, have, MIN_RETURNS),
            analyzer,
            value_at_risk: 0.0,
            confidence_level: config.confidence_level,
            sample_size: have,
        });
    };

    let estimate = &fitted.estimate;
    let sigma = estimate.current_volatility();
    let z = z_score(fitted.current_return, estimate.return_mean, sigma);
    let severity = classify_severity(z, config.warning_z, config.critical_z);
    let sample_size = fitted.returns.len();

    tracing::debug!(
        series_id,
        current_return = fitted.current_return,
        sigma,
        z,
        %severity,
        "Classified current observation."
    );

    Ok(AnomalyResult {
        series_id: series_id.to_string(),
        current_value,
        z_score: z,
        conditional_volatility: sigma,
        persistence: estimate.persistence,
        half_life: estimate.half_life,
        long_run_variance: estimate.long_run_variance,
        severity,
        is_anomaly: z.abs() >= config.warning_z,
        confidence: confidence_score(sample_size),
        explanation: narrative::anomaly_explanation(
            config.locale,
            analyzer,
            severity,
            current_value,
            z,
            sigma,
        ),
        analyzer,
        value_at_risk: value_at_risk(sigma, config.confidence_level)?,
        confidence_level: config.confidence_level,
        sample_size,
    })
}

/// Both detection methods applied to the same input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComparison {
    pub series_id: String,
    pub current_value: f64,
    pub zscore: AnomalyResult,
    pub conditional: AnomalyResult,
    /// True when both methods reach the same `is_anomaly` verdict.
    pub agree: bool,
}

pub fn compare_methods(
    series_id: &str,
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<MethodComparison, AnalyticsError> {
    let zscore = classify(
        series_id,
        current_value,
        history,
        &AnalysisConfig {
            method: DetectionMethod::ZScore,
            ..config.clone()
        },
    )?;
    let conditional = classify(
        series_id,
        current_value,
        history,
        &AnalysisConfig {
            method: DetectionMethod::ConditionalVolatility,
            ..config.clone()
        },
    )?;

    Ok(MethodComparison {
        series_id: series_id.to_string(),
        current_value,
        agree: zscore.is_anomaly == conditional.is_anomaly,
        zscore,
        conditional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use configuration::Garch11Params;

    fn series(vals: &[f64]) -> Vec<DataPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vals.iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(start + chrono::Days::new(i as u64), *v))
            .collect()
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 5.0 + i as f64 * 0.01).collect()
    }

    #[test]
    fn constant_series_is_normal_in_both_modes() {
        for len in [1, 2, 30, 31, 45, 120] {
            let history = series(&vec![4.5; len]);
            let result = compare_methods("FLAT", 4.5, &history, &AnalysisConfig::default())
                .unwrap();
            for r in [&result.zscore, &result.conditional] {
                assert_eq!(r.z_score, 0.0, "len {len}, analyzer {}", r.analyzer);
                assert_eq!(r.severity, Severity::Normal);
                assert!(!r.is_anomaly);
            }
            assert!(result.agree);
        }
    }

    #[test]
    fn confidence_is_zero_at_the_floor_and_positive_above_it() {
        let config = AnalysisConfig::default();

        let at_floor = classify("S", 5.31, &series(&ramp(31)), &config).unwrap();
        assert_eq!(at_floor.sample_size, 30);
        assert_eq!(at_floor.confidence, 0.0);

        let above = classify("S", 5.32, &series(&ramp(32)), &config).unwrap();
        assert!(above.confidence > 0.0);
        assert!(above.confidence <= 100.0);
    }

    #[test]
    fn below_floor_result_is_degraded() {
        let result = classify("S", 9.0, &series(&ramp(20)), &AnalysisConfig::default()).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.severity, Severity::Normal);
        assert!(!result.is_anomaly);
        assert_eq!(result.conditional_volatility, 0.0);
        assert_eq!(result.half_life, 0.0);
        assert!(result.explanation.contains("Insufficient data"));
    }

    #[test]
    fn anticipated_ramp_is_normal_under_ewma() {
        let history = series(&ramp(60));
        let result = classify("RAMP", 5.60, &history, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.analyzer, Analyzer::Ewma);
        assert_eq!(result.severity, Severity::Normal);
        assert!(result.conditional_volatility < 0.01);
        assert!((result.persistence - 0.94).abs() < 1e-12);
        assert!(result.value_at_risk > 0.0);
    }

    #[test]
    fn plain_zscore_flags_the_same_ramp() {
        let history = series(&ramp(60));
        let config = AnalysisConfig {
            method: DetectionMethod::ZScore,
            zscore_window: 5,
            ..Default::default()
        };
        // Last 5 levels are 5.55..=5.59: the next step sits 3 steps above the mean,
        // with a standard deviation of sqrt(2) steps.
        let result = classify("RAMP", 5.60, &history, &config).unwrap();
        assert_eq!(result.analyzer, Analyzer::ZScore);
        assert_eq!(result.severity, Severity::Warning);
        assert_eq!(result.confidence, 100.0);
    }

    #[test]
    fn large_jump_is_critical() {
        let mut levels = Vec::new();
        for i in 0..80 {
            levels.push(100.0 + if i % 2 == 0 { 0.1 } else { -0.1 });
        }
        let history = series(&levels);
        let result = classify("JUMP", 110.0, &history, &AnalysisConfig::default()).unwrap();
        assert_eq!(result.severity, Severity::Critical);
        assert!(result.is_anomaly);
        assert!(result.confidence > 50.0);
    }

    #[test]
    fn garch_parameters_select_garch_analyzer() {
        let config = AnalysisConfig {
            garch: Some(Garch11Params { omega: 0.01, alpha: 0.1, beta: 0.85 }),
            ..Default::default()
        };
        let result = classify("G", 5.60, &series(&ramp(60)), &config).unwrap();
        assert_eq!(result.analyzer, Analyzer::Garch11);
        assert!((result.long_run_variance - 0.2).abs() < 1e-12);
    }

    #[test]
    fn severity_is_monotonic_in_magnitude() {
        let mut previous = Severity::Normal;
        for step in 0..400 {
            let z = step as f64 * 0.01;
            let severity = classify_severity(-z, 2.0, 3.0);
            assert!(severity >= previous);
            previous = severity;
        }
        assert_eq!(classify_severity(2.0, 2.0, 3.0), Severity::Warning);
        assert_eq!(classify_severity(3.0, 2.0, 3.0), Severity::Critical);
    }

    #[test]
    fn invalid_inputs_are_errors() {
        let config = AnalysisConfig::default();
        assert!(matches!(
            classify("S", 1.0, &[], &config),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(classify("S", f64::NAN, &series(&[1.0, 2.0]), &config).is_err());

        let bad = AnalysisConfig { critical_z: 1.0, ..Default::default() };
        assert!(matches!(
            classify("S", 1.0, &series(&[1.0]), &bad),
            Err(AnalyticsError::Config(_))
        ));
    }

    #[test]
    fn zh_locale_changes_only_the_text() {
        let history = series(&ramp(60));
        let en = classify("S", 5.60, &history, &AnalysisConfig::default()).unwrap();
        let zh = classify(
            "S",
            5.60,
            &history,
            &AnalysisConfig { locale: core_types::Locale::Zh, ..Default::default() },
        )
        .unwrap();
        assert_eq!(en.z_score, zh.z_score);
        assert_eq!(en.severity, zh.severity);
        assert_ne!(en.explanation, zh.explanation);
    }
}
