//! Conditional volatility estimation.
//!
//! This module provides volatility modeling over percentage log-returns:
//! - EWMA (RiskMetrics-style) variance recursion with a fixed decay factor
//! - GARCH(1,1) variance recursion with caller-supplied parameters
//! - Regime classification, volatility bands and value-at-risk on top of either
//! - Multi-step variance forecasts

use crate::error::AnalyticsError;
use crate::returns::{ensure_positive, log_return, log_returns};
use crate::statistics::{mean, mean_std, population_variance};
use configuration::{AnalysisConfig, VolatilityModel};
use core_types::{validate_series, values, DataPoint, VolatilityRegime};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Fewer returns than this and no volatility model is estimated.
pub const MIN_RETURNS: usize = 30;
/// Sample size at which the confidence score saturates.
pub const FULL_CONFIDENCE_RETURNS: usize = 100;
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Degrees of freedom of the Student-t used for value-at-risk.
pub const VAR_DEGREES_OF_FREEDOM: f64 = 4.0;

/// Output of one pass of a variance recursion over a return series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalVolatility {
    /// `σ²_0 ..= σ²_n`: the seed followed by one estimate per return.
    /// The last element is the variance expected for the next, unseen return.
    pub variance_path: Vec<f64>,
    pub return_mean: f64,
    pub unconditional_variance: f64,
    pub persistence: f64,
    /// Periods until a variance shock decays to half its size.
    pub half_life: f64,
    pub long_run_variance: f64,
}

impl ConditionalVolatility {
    pub fn current_variance(&self) -> f64 {
        self.variance_path.last().copied().unwrap_or(0.0)
    }

    /// Latest conditional volatility, in percent.
    pub fn current_volatility(&self) -> f64 {
        self.current_variance().sqrt()
    }

    pub fn volatility_path(&self) -> Vec<f64> {
        self.variance_path.iter().map(|v| v.sqrt()).collect()
    }
}

/// Runs the variance recursion selected by `model` over `returns`.
///
/// The recursion is seeded with the unconditional variance of the returns, and each
/// step uses the deviation of the previous return from the return mean.
pub fn estimate_conditional_volatility(
    returns: &[f64],
    model: &VolatilityModel,
) -> Result<ConditionalVolatility, AnalyticsError> {
    model.validate()?;
    if returns.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "volatility estimation requires at least one return".to_string(),
        ));
    }
    if let Some(index) = returns.iter().position(|r| !r.is_finite()) {
        return Err(AnalyticsError::InvalidInput(format!(
            "non-finite return at index {index}"
        )));
    }

    let return_mean = mean(returns);
    let unconditional_variance = population_variance(returns);

    let mut variance_path = Vec::with_capacity(returns.len() + 1);
    variance_path.push(unconditional_variance);
    let mut previous = unconditional_variance;
    for &r in returns {
        let shock = (r - return_mean).powi(2);
        let next = match *model {
            VolatilityModel::Ewma { lambda } => lambda * previous + (1.0 - lambda) * shock,
            VolatilityModel::Garch11 { omega, alpha, beta } => {
                omega + alpha * shock + beta * previous
            }
        };
        variance_path.push(next);
        previous = next;
    }

    let persistence = model.persistence();
    let long_run_variance = match *model {
        VolatilityModel::Ewma { .. } => unconditional_variance,
        VolatilityModel::Garch11 { omega, alpha, beta } => omega / (1.0 - alpha - beta),
    };

    tracing::debug!(
        returns = returns.len(),
        return_mean,
        unconditional_variance,
        final_variance = previous,
        "Conditional variance recursion complete."
    );

    Ok(ConditionalVolatility {
        variance_path,
        return_mean,
        unconditional_variance,
        persistence,
        half_life: half_life(persistence),
        long_run_variance,
    })
}

/// `ln(0.5) / ln(persistence)`; infinite when shocks never decay.
pub fn half_life(persistence: f64) -> f64 {
    if persistence >= 1.0 {
        f64::INFINITY
    } else if persistence <= 0.0 {
        0.0
    } else {
        0.5_f64.ln() / persistence.ln()
    }
}

/// Linear ramp from 0 at the data floor to 100 at `FULL_CONFIDENCE_RETURNS`.
pub fn confidence_score(return_count: usize) -> f64 {
    if return_count <= MIN_RETURNS {
        return 0.0;
    }
    let span = (FULL_CONFIDENCE_RETURNS - MIN_RETURNS) as f64;
    ((return_count - MIN_RETURNS) as f64 / span * 100.0).min(100.0)
}

/// One-sided value-at-risk of the next return at `confidence_level`,
/// from a standard Student-t with `VAR_DEGREES_OF_FREEDOM` scaled by `volatility`.
pub fn value_at_risk(volatility: f64, confidence_level: f64) -> Result<f64, AnalyticsError> {
    let t = StudentsT::new(0.0, 1.0, VAR_DEGREES_OF_FREEDOM)
        .map_err(|e| AnalyticsError::Calculation(format!("Student-t setup failed: {e}")))?;
    let quantile = t.inverse_cdf(1.0 - confidence_level);
    Ok((quantile * volatility).abs())
}

/// A fitted variance model together with the return of the current observation.
#[derive(Debug, Clone)]
pub(crate) struct FittedReturns {
    pub returns: Vec<f64>,
    pub estimate: ConditionalVolatility,
    pub current_return: f64,
}

/// Validates the inputs shared by every conditional-volatility operation and fits
/// the configured model. `Ok(None)` means the data floor was not met.
pub(crate) fn fit_with_current(
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<Option<FittedReturns>, AnalyticsError> {
    config.validate()?;
    let last = history.last().ok_or_else(|| {
        AnalyticsError::InvalidInput("history must contain at least one observation".to_string())
    })?;
    if !current_value.is_finite() {
        return Err(AnalyticsError::InvalidInput(format!(
            "current value must be finite, got {current_value}"
        )));
    }
    validate_series(history)?;

    let levels = values(history);
    ensure_positive(&levels)?;
    ensure_positive(&[current_value])?;

    let return_count = levels.len() - 1;
    if return_count < MIN_RETURNS {
        tracing::warn!(
            have = return_count,
            need = MIN_RETURNS,
            "Insufficient history for conditional volatility; returning a degraded result."
        );
        return Ok(None);
    }

    let returns = log_returns(&levels)?;
    let estimate = estimate_conditional_volatility(&returns, &config.volatility_model())?;
    let current_return = log_return(last.value, current_value);

    Ok(Some(FittedReturns {
        returns,
        estimate,
        current_return,
    }))
}

/// Regime thresholds derived from the conditional-volatility path: `mean ± std`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    pub low: f64,
    pub mean: f64,
    pub high: f64,
}

/// Conditional-volatility view of the current observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityAnalysisResult {
    /// Latest conditional volatility, in percent per period.
    pub conditional_volatility: f64,
    pub annualized_volatility: f64,
    pub current_return: f64,
    pub return_mean: f64,
    /// Level bounds for the current observation: last level moved by `mean ± k·σ`.
    pub upper_band: f64,
    pub lower_band: f64,
    pub upper_breakout: bool,
    pub lower_breakout: bool,
    pub regime: VolatilityRegime,
    pub regime_thresholds: RegimeThresholds,
    pub value_at_risk: f64,
    pub confidence_level: f64,
    pub persistence: f64,
    pub half_life: f64,
    pub long_run_variance: f64,
    /// Number of returns the model was estimated from.
    pub sample_size: usize,
    pub sufficient_data: bool,
}

impl VolatilityAnalysisResult {
    fn insufficient(sample_size: usize, confidence_level: f64) -> Self {
        Self {
            conditional_volatility: 0.0,
            annualized_volatility: 0.0,
            current_return: 0.0,
            return_mean: 0.0,
            upper_band: 0.0,
            lower_band: 0.0,
            upper_breakout: false,
            lower_breakout: false,
            regime: VolatilityRegime::Normal,
            regime_thresholds: RegimeThresholds {
                low: 0.0,
                mean: 0.0,
                high: 0.0,
            },
            value_at_risk: 0.0,
            confidence_level,
            persistence: 0.0,
            half_life: 0.0,
            long_run_variance: 0.0,
            sample_size,
            sufficient_data: false,
        }
    }
}

/// Estimates conditional volatility and places `current_value` against it.
pub fn analyze_volatility(
    current_value: f64,
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<VolatilityAnalysisResult, AnalyticsError> {
    let Some(fitted) = fit_with_current(current_value, history, config)? else {
        let sample_size = history.len().saturating_sub(1);
        return Ok(VolatilityAnalysisResult::insufficient(
            sample_size,
            config.confidence_level,
        ));
    };
    let estimate = &fitted.estimate;
    let sigma = estimate.current_volatility();

    let path = estimate.volatility_path();
    let (path_mean, path_std) = mean_std(&path);
    let thresholds = RegimeThresholds {
        low: path_mean - path_std,
        mean: path_mean,
        high: path_mean + path_std,
    };
    let regime = if path_std <= 0.0 {
        VolatilityRegime::Normal
    } else if sigma > thresholds.high {
        VolatilityRegime::High
    } else if sigma < thresholds.low {
        VolatilityRegime::Low
    } else {
        VolatilityRegime::Normal
    };

    // `fit_with_current` guarantees a non-empty history.
    let last_level = history.last().map(|p| p.value).unwrap_or(current_value);
    let k = config.band_width;
    let upper_band = last_level * ((estimate.return_mean + k * sigma) / 100.0).exp();
    let lower_band = last_level * ((estimate.return_mean - k * sigma) / 100.0).exp();

    Ok(VolatilityAnalysisResult {
        conditional_volatility: sigma,
        annualized_volatility: sigma * TRADING_DAYS_PER_YEAR.sqrt(),
        current_return: fitted.current_return,
        return_mean: estimate.return_mean,
        upper_band,
        lower_band,
        upper_breakout: current_value > upper_band,
        lower_breakout: current_value < lower_band,
        regime,
        regime_thresholds: thresholds,
        value_at_risk: value_at_risk(sigma, config.confidence_level)?,
        confidence_level: config.confidence_level,
        persistence: estimate.persistence,
        half_life: estimate.half_life,
        long_run_variance: estimate.long_run_variance,
        sample_size: fitted.returns.len(),
        sufficient_data: true,
    })
}

/// Direction of a volatility forecast over its horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastTrend {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityForecast {
    pub horizon: usize,
    pub variance_forecast: Vec<f64>,
    pub volatility_forecast: Vec<f64>,
    pub annualized_volatility: Vec<f64>,
    /// Approximate 95% interval: `σ ± 1.96·σ/√n`.
    pub lower_bound: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub trend: ForecastTrend,
    pub sample_size: usize,
    pub sufficient_data: bool,
}

/// Forecasts the conditional variance `config.forecast_horizon` periods ahead.
///
/// EWMA forecasts are flat. GARCH(1,1) forecasts revert geometrically towards the
/// long-run variance at rate `α + β`.
pub fn forecast_volatility(
    history: &[DataPoint],
    config: &AnalysisConfig,
) -> Result<VolatilityForecast, AnalyticsError> {
    config.validate()?;
    if history.is_empty() {
        return Err(AnalyticsError::InvalidInput(
            "history must contain at least one observation".to_string(),
        ));
    }
    validate_series(history)?;
    let levels = values(history);
    ensure_positive(&levels)?;

    let horizon = config.forecast_horizon;
    let return_count = levels.len() - 1;
    if return_count < MIN_RETURNS {
        tracing::warn!(
            have = return_count,
            need = MIN_RETURNS,
            "Insufficient history for a volatility forecast."
        );
        return Ok(VolatilityForecast {
            horizon,
            variance_forecast: Vec::new(),
            volatility_forecast: Vec::new(),
            annualized_volatility: Vec::new(),
            lower_bound: Vec::new(),
            upper_bound: Vec::new(),
            trend: ForecastTrend::Stable,
            sample_size: return_count,
            sufficient_data: false,
        });
    }

    let returns = log_returns(&levels)?;
    let model = config.volatility_model();
    let estimate = estimate_conditional_volatility(&returns, &model)?;
    let next = estimate.current_variance();

    let variance_forecast: Vec<f64> = (1..=horizon)
        .map(|h| match model {
            VolatilityModel::Ewma { .. } => next,
            VolatilityModel::Garch11 { .. } => {
                let lrv = estimate.long_run_variance;
                lrv + estimate.persistence.powi(h as i32 - 1) * (next - lrv)
            }
        })
        .collect();
    let volatility_forecast: Vec<f64> = variance_forecast.iter().map(|v| v.sqrt()).collect();
    let annualized_volatility = volatility_forecast
        .iter()
        .map(|v| v * TRADING_DAYS_PER_YEAR.sqrt())
        .collect();

    let root_n = (returns.len() as f64).sqrt();
    let lower_bound = volatility_forecast
        .iter()
        .map(|v| v - 1.96 * v / root_n)
        .collect();
    let upper_bound = volatility_forecast
        .iter()
        .map(|v| v + 1.96 * v / root_n)
        .collect();

    let trend = match (volatility_forecast.first(), volatility_forecast.last()) {
        (Some(&first), Some(&last)) if last > first * (1.0 + 1e-9) => ForecastTrend::Rising,
        (Some(&first), Some(&last)) if last < first * (1.0 - 1e-9) => ForecastTrend::Falling,
        _ => ForecastTrend::Stable,
    };

    Ok(VolatilityForecast {
        horizon,
        variance_forecast,
        volatility_forecast,
        annualized_volatility,
        lower_bound,
        upper_bound,
        trend,
        sample_size: returns.len(),
        sufficient_data: true,
    })
}
