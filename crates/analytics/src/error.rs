use configuration::error::ConfigError;
use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid observation series: {0}")]
    Series(#[from] CoreError),

    #[error("Invalid analysis configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}
