use crate::error::ConfigError;
use core_types::Locale;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

// --- Accepted input contract ---
// These bounds apply whatever the transport: HTTP query, CLI flag, TOML or env.

pub const WINDOW_SIZE_BOUNDS: RangeInclusive<usize> = 5..=365;
pub const SIMILARITY_THRESHOLD_BOUNDS: RangeInclusive<f64> = 0.5..=1.0;
pub const MIN_EVENT_DURATION_BOUNDS: RangeInclusive<usize> = 1..=365;
pub const MAX_EVENTS_BOUNDS: RangeInclusive<usize> = 1..=50;
pub const STRIDE_BOUNDS: RangeInclusive<usize> = 1..=365;
pub const ZSCORE_WINDOW_BOUNDS: RangeInclusive<usize> = 2..=1000;
pub const CONFIDENCE_LEVEL_BOUNDS: RangeInclusive<f64> = 0.90..=0.99;
pub const BAND_WIDTH_BOUNDS: RangeInclusive<f64> = 0.5..=5.0;
pub const FORECAST_HORIZON_BOUNDS: RangeInclusive<usize> = 1..=30;

/// Which estimator the anomaly classifier uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Z-score of the raw level against a trailing window.
    #[cfg_attr(feature = "clap", value(name = "zscore"))]
    ZScore,
    /// Z-score of the log-return against the conditional volatility.
    #[default]
    ConditionalVolatility,
}

/// What the similarity search does with a current window shorter than `window_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CurrentWindowPolicy {
    /// Fail with an invalid-input error.
    #[default]
    Reject,
    /// Search with the current window's own length instead.
    Shrink,
}

/// Fixed GARCH(1,1) parameters, e.g. from an offline maximum-likelihood fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Garch11Params {
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// The conditional-variance recursion used by the volatility estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VolatilityModel {
    /// `σ²_t = λ·σ²_{t-1} + (1-λ)·ε²_{t-1}`
    Ewma { lambda: f64 },
    /// `σ²_t = ω + α·ε²_{t-1} + β·σ²_{t-1}`
    Garch11 { omega: f64, alpha: f64, beta: f64 },
}

impl VolatilityModel {
    /// Fraction of a variance shock carried into the next period.
    pub fn persistence(&self) -> f64 {
        match *self {
            VolatilityModel::Ewma { lambda } => lambda,
            VolatilityModel::Garch11 { alpha, beta, .. } => alpha + beta,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            VolatilityModel::Ewma { lambda } => {
                if !(lambda > 0.0 && lambda < 1.0) {
                    return Err(ConfigError::ValidationError(format!(
                        "lambda must be strictly between 0 and 1, got {lambda}"
                    )));
                }
            }
            VolatilityModel::Garch11 { omega, alpha, beta } => {
                if !omega.is_finite() || omega <= 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "garch omega must be positive, got {omega}"
                    )));
                }
                if !alpha.is_finite() || !beta.is_finite() || alpha < 0.0 || beta < 0.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "garch alpha and beta must be non-negative, got alpha={alpha}, beta={beta}"
                    )));
                }
                if alpha + beta >= 1.0 {
                    return Err(ConfigError::ValidationError(format!(
                        "garch alpha + beta must be below 1 for a finite long-run variance, got {}",
                        alpha + beta
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Caller-supplied parameters for every analysis in the engine.
///
/// Every field has a default, so a TOML file or an environment override only
/// needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    // I. Historical similarity search
    /// Candidate/event window length in points.
    pub window_size: usize,
    pub similarity_threshold: f64,
    /// Minimum length, in points, of a merged event region.
    pub min_event_duration: usize,
    pub max_events: usize,
    /// Step between consecutive candidate windows.
    pub stride: usize,
    pub current_window_policy: CurrentWindowPolicy,

    // II. Anomaly classification
    pub method: DetectionMethod,
    /// EWMA decay factor.
    pub lambda: f64,
    /// When present, replaces the EWMA recursion with GARCH(1,1).
    pub garch: Option<Garch11Params>,
    pub warning_z: f64,
    pub critical_z: f64,
    /// Trailing reference population for plain Z-score mode.
    pub zscore_window: usize,

    // III. Volatility analytics
    pub confidence_level: f64,
    pub band_width: f64,
    pub forecast_horizon: usize,

    // IV. Rendering
    pub locale: Locale,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            similarity_threshold: 0.85,
            min_event_duration: 5,
            max_events: 5,
            stride: 1,
            current_window_policy: CurrentWindowPolicy::Reject,
            method: DetectionMethod::ConditionalVolatility,
            lambda: 0.94,
            garch: None,
            warning_z: 2.0,
            critical_z: 3.0,
            zscore_window: 50,
            confidence_level: 0.95,
            band_width: 2.0,
            forecast_horizon: 5,
            locale: Locale::En,
        }
    }
}

impl AnalysisConfig {
    /// The volatility recursion selected by this configuration.
    pub fn volatility_model(&self) -> VolatilityModel {
        match self.garch {
            Some(Garch11Params { omega, alpha, beta }) => {
                VolatilityModel::Garch11 { omega, alpha, beta }
            }
            None => VolatilityModel::Ewma {
                lambda: self.lambda,
            },
        }
    }

    /// Rejects any value outside the documented bounds. Nothing is coerced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_usize("window_size", self.window_size, &WINDOW_SIZE_BOUNDS)?;
        check_f64(
            "similarity_threshold",
            self.similarity_threshold,
            &SIMILARITY_THRESHOLD_BOUNDS,
        )?;
        check_usize(
            "min_event_duration",
            self.min_event_duration,
            &MIN_EVENT_DURATION_BOUNDS,
        )?;
        check_usize("max_events", self.max_events, &MAX_EVENTS_BOUNDS)?;
        check_usize("stride", self.stride, &STRIDE_BOUNDS)?;
        check_usize("zscore_window", self.zscore_window, &ZSCORE_WINDOW_BOUNDS)?;
        check_f64(
            "confidence_level",
            self.confidence_level,
            &CONFIDENCE_LEVEL_BOUNDS,
        )?;
        check_f64("band_width", self.band_width, &BAND_WIDTH_BOUNDS)?;
        check_usize(
            "forecast_horizon",
            self.forecast_horizon,
            &FORECAST_HORIZON_BOUNDS,
        )?;

        if !self.warning_z.is_finite() || self.warning_z <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "warning_z must be positive, got {}",
                self.warning_z
            )));
        }
        if !self.critical_z.is_finite() || self.critical_z <= self.warning_z {
            return Err(ConfigError::ValidationError(format!(
                "critical_z must exceed warning_z ({}), got {}",
                self.warning_z, self.critical_z
            )));
        }

        // Lambda is checked even when GARCH parameters override it.
        VolatilityModel::Ewma {
            lambda: self.lambda,
        }
        .validate()?;
        if self.garch.is_some() {
            self.volatility_model().validate()?;
        }

        Ok(())
    }
}

fn check_usize(
    field: &str,
    value: usize,
    bounds: &RangeInclusive<usize>,
) -> Result<(), ConfigError> {
    if bounds.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must be within {}..={}, got {value}",
            bounds.start(),
            bounds.end()
        )))
    }
}

fn check_f64(field: &str, value: f64, bounds: &RangeInclusive<f64>) -> Result<(), ConfigError> {
    // `contains` is false for NaN, so non-finite values are rejected here too.
    if bounds.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must be within {}..={}, got {value}",
            bounds.start(),
            bounds.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volatility_model(), VolatilityModel::Ewma { lambda: 0.94 });
    }

    #[test]
    fn rejects_each_out_of_range_field() {
        let cases = [
            AnalysisConfig { window_size: 4, ..Default::default() },
            AnalysisConfig { window_size: 366, ..Default::default() },
            AnalysisConfig { similarity_threshold: 0.49, ..Default::default() },
            AnalysisConfig { similarity_threshold: f64::NAN, ..Default::default() },
            AnalysisConfig { min_event_duration: 0, ..Default::default() },
            AnalysisConfig { max_events: 51, ..Default::default() },
            AnalysisConfig { stride: 0, ..Default::default() },
            AnalysisConfig { lambda: 1.0, ..Default::default() },
            AnalysisConfig { lambda: 0.0, ..Default::default() },
            AnalysisConfig { warning_z: 0.0, ..Default::default() },
            AnalysisConfig { critical_z: 2.0, ..Default::default() },
            AnalysisConfig { confidence_level: 0.5, ..Default::default() },
            AnalysisConfig { forecast_horizon: 31, ..Default::default() },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::ValidationError(_))),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn accepts_bound_edges() {
        let config = AnalysisConfig {
            window_size: 5,
            similarity_threshold: 1.0,
            min_event_duration: 365,
            max_events: 50,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn garch_parameters_select_garch_model() {
        let config = AnalysisConfig {
            garch: Some(Garch11Params { omega: 0.01, alpha: 0.08, beta: 0.9 }),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        let model = config.volatility_model();
        assert!((model.persistence() - 0.98).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_stationary_garch() {
        let config = AnalysisConfig {
            garch: Some(Garch11Params { omega: 0.01, alpha: 0.2, beta: 0.8 }),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let negative = VolatilityModel::Garch11 { omega: -1.0, alpha: 0.1, beta: 0.1 };
        assert!(negative.validate().is_err());
    }
}
