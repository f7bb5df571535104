use super::Geocoder;
use crate::domain::customer::Coordinates;
use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::GeocoderConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Deserialize)]
struct TmapResponse {
    #[serde(rename = "coordinateInfo")]
    coordinate_info: Option<TmapCoordinateInfo>,
}

#[derive(Deserialize)]
struct TmapCoordinateInfo {
    #[serde(default)]
    coordinate: Vec<TmapCoordinate>,
}

// Old-style addresses fill lat/lon, road-name addresses fill newLat/newLon.
// Values arrive as strings, sometimes empty.
#[derive(Deserialize)]
struct TmapCoordinate {
    lat: Option<Value>,
    lon: Option<Value>,
    #[serde(rename = "newLat")]
    new_lat: Option<Value>,
    #[serde(rename = "newLon")]
    new_lon: Option<Value>,
}

impl TmapCoordinate {
    fn coordinates(&self) -> Option<Coordinates> {
        let latitude = first_number(&[&self.lat, &self.new_lat])?;
        let longitude = first_number(&[&self.lon, &self.new_lon])?;
        Some(Coordinates {
            latitude,
            longitude,
        })
    }
}

fn first_number(candidates: &[&Option<Value>]) -> Option<f64> {
    candidates.iter().find_map(|value| match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// SK T Map full-address geocoder
pub struct TmapGeocoder {
    client: reqwest::Client,
    base_url: String,
    app_key: String,
}

impl TmapGeocoder {
    pub fn new(base_url: impl Into<String>, app_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            base_url: base_url.into(),
            app_key: app_key.into(),
        }
    }

    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        let app_key = config
            .app_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("Missing app key for T Map geocoder".to_string()))?;

        Ok(Self::new(
            config.base_url.clone(),
            app_key,
            Duration::from_secs(config.timeout_secs),
        ))
    }

    fn request_url(&self, address: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid geocoder URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("version", "1")
            .append_pair("format", "json")
            .append_pair("coordType", "WGS84GEO")
            .append_pair("fullAddr", address);
        Ok(url)
    }

    fn parse_body(body: &str) -> Result<Option<Coordinates>> {
        let json: TmapResponse = serde_json::from_str(body)
            .map_err(|e| AppError::GeocodeError(format!("Failed to parse JSON: {}", e)))?;

        Ok(json
            .coordinate_info
            .and_then(|info| info.coordinate.into_iter().next())
            .and_then(|coordinate| coordinate.coordinates()))
    }
}

#[async_trait]
impl Geocoder for TmapGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let url = self.request_url(address)?;
        let response = self
            .client
            .get(url)
            .header("appKey", &self.app_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::GeocodeError(format!("Request failed: {}", e)))?;

        // T Map answers 204 when the address is unknown
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            debug!(address, "No geocode match");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::GeocodeError(format!(
                "API error ({}): {}",
                status, text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::GeocodeError(format!("Failed to read body: {}", e)))?;

        Self::parse_body(&body)
    }
}
