use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use tracing::debug;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::IngestConfig;

/// Environment prefix; nested keys use `__`, e.g. `INTAKE_GEOCODER__APP_KEY`
pub const ENV_PREFIX: &str = "INTAKE_";

/// Layered configuration: defaults, then the TOML file, then environment.
/// A `.env` file in the working directory is loaded into the environment first.
pub fn load_config(path: Option<&Path>) -> Result<IngestConfig> {
    if let Ok(env_file) = dotenvy::dotenv() {
        debug!(path = %env_file.display(), "Loaded .env file");
    }

    let mut figment = Figment::from(Serialized::defaults(IngestConfig::default()));

    if let Some(path) = path {
        if !path.exists() {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: IngestConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

    config
        .validate()
        .map_err(|e| AppError::ConfigError(format!("Invalid configuration: {}", e)))?;

    Ok(config)
}
