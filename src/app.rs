use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::application::use_cases::customer_import::CustomerImport;
use crate::domain::error::Result;
use crate::infrastructure::bootstrap::bootstrap;
use crate::infrastructure::config::load_config;

/// Install the global fmt subscriber. `RUST_LOG` wins over `filter`.
/// Calling this twice is harmless.
pub fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}

/// Load configuration, start logging and wire the import pipeline
pub async fn start(config_path: Option<&Path>) -> Result<CustomerImport> {
    let config = load_config(config_path)?;
    init_tracing(&config.log_filter);
    bootstrap(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing("debug");
        init_tracing("info");
        tracing::info!("still logging");
    }
}
