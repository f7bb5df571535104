pub mod tmap;

use crate::domain::customer::Coordinates;
use crate::domain::error::Result;
use async_trait::async_trait;

pub use tmap::TmapGeocoder;

/// Resolves a free-form address to WGS84 coordinates.
/// `Ok(None)` means the provider answered but found nothing.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;
}

/// Geocoder used when lookups are disabled; every address stays unresolved
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
        Ok(None)
    }
}
