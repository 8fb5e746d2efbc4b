use crate::error::CoreError;
use crate::structs::DataPoint;
use chrono::NaiveDate;

/// Checks the invariants every observation sequence must satisfy before analysis:
/// finite values, dates strictly ascending, no duplicate dates.
///
/// An empty slice is valid here; entry points that need at least one point
/// reject emptiness themselves so the error names the right argument.
pub fn validate_series(points: &[DataPoint]) -> Result<(), CoreError> {
    for (index, point) in points.iter().enumerate() {
        if !point.value.is_finite() {
            return Err(CoreError::NonFiniteValue {
                index,
                date: point.date,
            });
        }
        if index > 0 {
            let prev = points[index - 1].date;
            if point.date == prev {
                return Err(CoreError::DuplicateDate(point.date));
            }
            if point.date < prev {
                return Err(CoreError::UnsortedSeries {
                    index,
                    date: point.date,
                });
            }
        }
    }
    Ok(())
}

/// Returns the points whose date falls inside the inclusive `[start, end]` range.
///
/// Either bound may be omitted. The input is assumed to be sorted.
pub fn slice_by_date(
    points: &[DataPoint],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<&[DataPoint], CoreError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(CoreError::InvalidDateRange { start, end });
        }
    }

    let from = match start {
        Some(start) => points.partition_point(|p| p.date < start),
        None => 0,
    };
    let to = match end {
        Some(end) => points.partition_point(|p| p.date <= end),
        None => points.len(),
    };

    if from >= to {
        tracing::debug!(?start, ?end, "Date range selects no observations.");
        return Ok(&[]);
    }
    Ok(&points[from..to])
}

/// Extracts the raw values of a sequence.
pub fn values(points: &[DataPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}
