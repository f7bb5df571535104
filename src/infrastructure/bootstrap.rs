use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::use_cases::customer_import::CustomerImport;
use crate::domain::error::Result;
use crate::domain::ingest_config::{GeocoderConfig, GeocoderProvider, IngestConfig};
use crate::infrastructure::db::{CustomerStore, InMemoryCustomerStore, SqliteCustomerStore};
use crate::infrastructure::geocoding::{Geocoder, NoopGeocoder, TmapGeocoder};

/// `database_url` value selecting the process-local store
pub const IN_MEMORY_STORE: &str = "memory://";

pub async fn bootstrap(config: &IngestConfig) -> Result<CustomerImport> {
    let store = build_store(&config.database_url).await?;
    let geocoder = build_geocoder(&config.geocoder)?;

    info!(
        database_url = %config.database_url,
        provider = ?config.geocoder.provider,
        concurrency = config.geocoder.concurrency,
        "Customer import ready"
    );

    Ok(CustomerImport::new(
        store,
        geocoder,
        &config.import,
        config.geocoder.concurrency,
    ))
}

pub async fn build_store(database_url: &str) -> Result<Arc<dyn CustomerStore>> {
    if database_url == IN_MEMORY_STORE {
        return Ok(Arc::new(InMemoryCustomerStore::new()));
    }

    let store = SqliteCustomerStore::init(database_url).await.map_err(|err| {
        error!(error = %err, database_url, "Failed to init customer store");
        err
    })?;
    Ok(Arc::new(store))
}

/// Disabled provider or a missing key both fall back to the no-op geocoder
pub fn build_geocoder(config: &GeocoderConfig) -> Result<Arc<dyn Geocoder>> {
    match config.provider {
        GeocoderProvider::Disabled => Ok(Arc::new(NoopGeocoder)),
        GeocoderProvider::Tmap => {
            let has_key = config
                .app_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty());
            if !has_key {
                warn!("No T Map app key configured; customers will be stored without coordinates");
                return Ok(Arc::new(NoopGeocoder));
            }
            Ok(Arc::new(TmapGeocoder::from_config(config)?))
        }
    }
}
