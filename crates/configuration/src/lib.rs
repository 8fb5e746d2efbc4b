use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    AnalysisConfig, CurrentWindowPolicy, DetectionMethod, Garch11Params, VolatilityModel,
};

/// Prefix for environment-variable overrides, e.g. `ECONLENS_WINDOW_SIZE=60`
/// or `ECONLENS_GARCH__OMEGA=0.01` for nested keys.
pub const ENV_PREFIX: &str = "ECONLENS";

/// Loads the analysis configuration.
///
/// Sources are layered in this order, later ones winning: built-in defaults,
/// the optional TOML file at `path`, then `ECONLENS_*` environment variables.
/// The merged result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        tracing::debug!(path = %path.display(), "Reading analysis configuration file.");
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Missing keys fall back to the `Default` impl through `#[serde(default)]`.
    let config = settings.try_deserialize::<AnalysisConfig>()?;
    config.validate()?;

    Ok(config)
}
