// ============================================================
// INGEST CONFIGURATION
// ============================================================
// Configuration values for the import pipeline and its collaborators

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Which rows the normalizer silently drops before validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFilter {
    /// Drop rows that have no customer name after header mapping
    #[default]
    MissingCustomerName,
    /// Drop only rows whose cells are all empty; nameless rows are reported invalid
    BlankRows,
}

/// Which outcome wins when a row is both a duplicate and has field errors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    #[default]
    DuplicateFirst,
    ErrorsFirst,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocoderProvider {
    #[default]
    Tmap,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,

    #[validate(url)]
    pub base_url: String,

    /// API key; without one geocoding is skipped and rows keep null coordinates
    pub app_key: Option<String>,

    #[validate(range(min = 1, max = 120))]
    pub timeout_secs: u64,

    /// Maximum geocode requests in flight per commit
    #[validate(range(min = 1, max = 64))]
    pub concurrency: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::Tmap,
            base_url: "https://apis.openapi.sk.com/tmap/geo/fullAddrGeo".to_string(),
            app_key: None,
            timeout_secs: 10,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImportPolicy {
    pub row_filter: RowFilter,
    pub precedence: Precedence,
    /// Fill a missing receipt date with today's date at commit time
    pub default_receipt_date_to_today: bool,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            row_filter: RowFilter::default(),
            precedence: Precedence::default(),
            default_receipt_date_to_today: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IngestConfig {
    #[validate(length(min = 1))]
    pub database_url: String,

    #[validate(nested)]
    pub geocoder: GeocoderConfig,

    #[validate(nested)]
    pub import: ImportPolicy,

    /// `tracing-subscriber` env filter directive
    #[validate(length(min = 1))]
    pub log_filter: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://customers.db".to_string(),
            geocoder: GeocoderConfig::default(),
            import: ImportPolicy::default(),
            log_filter: "info".to_string(),
        }
    }
}
