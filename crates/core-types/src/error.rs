use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite value at index {index} ({date})")]
    NonFiniteValue { index: usize, date: NaiveDate },

    #[error("Series is not sorted by date: index {index} ({date}) precedes its predecessor")]
    UnsortedSeries { index: usize, date: NaiveDate },

    #[error("Duplicate observation date {0}")]
    DuplicateDate(NaiveDate),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}
