use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::{validate_series, DataPoint};
use serde::{Deserialize, Serialize};

/// Descriptive statistics of an observation sequence.
///
/// Recomputed on every call; the engine never caches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub mean: f64,
    /// Population standard deviation (divides by `count`).
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl StatisticsSummary {
    /// Zero-safe Z-score of `value` against this summary.
    pub fn z_score(&self, value: f64) -> f64 {
        z_score(value, self.mean, self.std_dev)
    }
}

/// Computes mean, population standard deviation and exact extrema.
///
/// A single point yields `std_dev == 0`.
pub fn compute_statistics(points: &[DataPoint]) -> Result<StatisticsSummary, AnalyticsError> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(AnalyticsError::InvalidInput(
                "statistics require at least one observation".to_string(),
            ));
        }
    };
    validate_series(points)?;

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let (min, max) = min_max(&values);
    let (mean, std_dev) = mean_std(&values);

    Ok(StatisticsSummary {
        mean,
        std_dev,
        min,
        max,
        count: points.len(),
        start_date: first.date,
        end_date: last.date,
    })
}

/// Per-point Z-scores. A zero-variance sequence maps every point to 0.
pub fn z_scores(points: &[DataPoint]) -> Result<Vec<f64>, AnalyticsError> {
    let summary = compute_statistics(points)?;
    Ok(points.iter().map(|p| summary.z_score(p.value)).collect())
}

/// `(value - mean) / std_dev`, or 0 when the dispersion is zero.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev > 0.0 {
        (value - mean) / std_dev
    } else {
        0.0
    }
}

/// Magnitudes above this are rescaled before summing so the sums stay finite.
const RESCALE_ABOVE: f64 = 1e150;

/// Power of two that brings the largest magnitude near 1, or 1 for ordinary data.
/// Dividing by a power of two is exact, so rescaling costs no precision.
fn magnitude_scale(values: &[f64]) -> f64 {
    let max_abs = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max_abs > RESCALE_ABOVE {
        2.0_f64.powi(max_abs.log2().floor() as i32)
    } else {
        1.0
    }
}

/// Mean and population variance of `values / scale`.
fn scaled_moments(values: &[f64], scale: f64) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().map(|&x| x / scale).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&x| (x / scale - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let scale = magnitude_scale(values);
    scaled_moments(values, scale).0 * scale
}

/// Population variance. Returns exactly 0 for a constant sequence.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let scale = magnitude_scale(values);
    scaled_moments(values, scale).1 * scale * scale
}

/// Mean and population standard deviation. Both stay finite for any finite input.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if is_constant(values) {
        // Summing a constant can drift by an ulp; report the exact value instead.
        return (values.first().copied().unwrap_or(0.0), 0.0);
    }
    let scale = magnitude_scale(values);
    let (mean, variance) = scaled_moments(values, scale);
    (mean * scale, variance.sqrt() * scale)
}

pub fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        })
}

fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(&first) => values.iter().all(|&v| v == first),
        None => true,
    }
}

/// Shape-only representation of a window.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Zero dispersion: only matches other flat windows.
    Flat,
    Normalized(Vec<f64>),
}

/// Subtracts the mean and divides by the population standard deviation.
pub fn z_normalize(values: &[f64]) -> Shape {
    let (mean, std_dev) = mean_std(values);
    if std_dev <= 0.0 || !std_dev.is_finite() {
        return Shape::Flat;
    }
    Shape::Normalized(values.iter().map(|&v| (v - mean) / std_dev).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(vals: &[f64]) -> Vec<DataPoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        vals.iter()
            .enumerate()
            .map(|(i, v)| DataPoint::new(start + chrono::Days::new(i as u64), *v))
            .collect()
    }

    #[test]
    fn single_point_has_zero_dispersion() {
        let summary = compute_statistics(&series(&[4.25])).unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.min, 4.25);
        assert_eq!(summary.max, 4.25);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.start_date, summary.end_date);
    }

    #[test]
    fn uses_population_standard_deviation() {
        let summary = compute_statistics(&series(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap();
        assert_eq!(summary.mean, 3.0);
        // Population variance of 1..=5 is 2.0.
        assert!((summary.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 5.0);
    }

    #[test]
    fn constant_series_has_zero_z_scores() {
        for len in [1, 2, 3, 17, 100] {
            let points = series(&vec![0.1; len]);
            let summary = compute_statistics(&points).unwrap();
            assert_eq!(summary.std_dev, 0.0);
            assert!(z_scores(&points).unwrap().iter().all(|&z| z == 0.0));
        }
    }

    #[test]
    fn z_scores_are_centered() {
        let zs = z_scores(&series(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])).unwrap();
        // Mean 5, population std 2.
        assert_eq!(zs[0], -1.5);
        assert_eq!(zs[7], 2.0);
        assert!(zs.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        let summary =
            compute_statistics(&series(&[1e308, 1e308, -1e308, 1.7e308])).unwrap();
        assert!(summary.mean.is_finite());
        assert!(summary.std_dev.is_finite());
        assert!((summary.mean - 6.75e307).abs() / 6.75e307 < 1e-12);
        assert!(summary.std_dev > 0.0);
        assert!(matches!(
            z_normalize(&[1e308, -1e308, 1.7e308]),
            Shape::Normalized(_)
        ));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            compute_statistics(&[]),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut points = series(&[1.0, 2.0]);
        points[0].value = f64::NEG_INFINITY;
        assert!(matches!(
            compute_statistics(&points),
            Err(AnalyticsError::Series(_))
        ));
    }

    #[test]
    fn normalization_detects_flat_windows() {
        assert_eq!(z_normalize(&[3.0, 3.0, 3.0]), Shape::Flat);
        match z_normalize(&[1.0, 2.0, 3.0]) {
            Shape::Normalized(v) => {
                assert!((mean(&v)).abs() < 1e-12);
                assert!((population_variance(&v) - 1.0).abs() < 1e-12);
            }
            Shape::Flat => panic!("ramp must not be flat"),
        }
    }
}
