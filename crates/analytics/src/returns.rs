use crate::error::AnalyticsError;

/// Percentage log-return between two consecutive levels.
pub fn log_return(previous: f64, current: f64) -> f64 {
    (current / previous).ln() * 100.0
}

/// Percentage log-returns `ln(v_i / v_{i-1}) * 100` of a level sequence.
///
/// Every level must be strictly positive for the logarithm to exist.
pub fn log_returns(values: &[f64]) -> Result<Vec<f64>, AnalyticsError> {
    ensure_positive(values)?;
    Ok(values.windows(2).map(|w| log_return(w[0], w[1])).collect())
}

pub fn ensure_positive(values: &[f64]) -> Result<(), AnalyticsError> {
    match values.iter().position(|&v| v <= 0.0) {
        Some(index) => Err(AnalyticsError::InvalidInput(format!(
            "log-returns require strictly positive values, found {} at index {index}",
            values[index]
        ))),
        None => Ok(()),
    }
}

/// Simple percentage changes, skipping steps whose base is zero.
///
/// Used where levels may cross zero (e.g. spreads), where log-returns do not exist.
pub fn percent_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0].abs() * 100.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_returns_are_percentages() {
        let r = log_returns(&[100.0, 110.0, 99.0]).unwrap();
        assert_eq!(r.len(), 2);
        assert!((r[0] - 9.531017980432486).abs() < 1e-12);
        assert!((r[1] - (0.9_f64).ln() * 100.0).abs() < 1e-12);
    }

    #[test]
    fn constant_levels_have_zero_returns() {
        let r = log_returns(&[5.25; 10]).unwrap();
        assert!(r.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn non_positive_levels_are_rejected() {
        assert!(matches!(
            log_returns(&[1.0, 0.0, 2.0]),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(log_returns(&[-1.0, 2.0]).is_err());
    }

    #[test]
    fn percent_changes_skip_zero_base() {
        let c = percent_changes(&[0.0, 2.0, 3.0, -3.0]);
        assert_eq!(c, vec![50.0, -200.0]);
    }
}
