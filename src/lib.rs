//! Bulk customer import: decode a spreadsheet upload, map its columns onto
//! the customer schema, classify every row as valid, invalid or duplicate,
//! then geocode and store the valid ones.

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::CustomerImport;
pub use domain::classification::{
    ClassifiedRow, DuplicateReason, ImportPreview, RowStatus, UploadResult, ValidationReport,
    ValidationSummary,
};
pub use domain::customer::{CanonicalRecord, Coordinates, EnrichedRecord};
pub use domain::error::{AppError, Result};
pub use domain::ingest_config::{ImportPolicy, IngestConfig, Precedence, RowFilter};
pub use domain::sheet::{CellValue, RawRow, SheetFormat};
pub use infrastructure::db::{CustomerStore, InMemoryCustomerStore, SqliteCustomerStore};
pub use infrastructure::geocoding::{Geocoder, NoopGeocoder, TmapGeocoder};
