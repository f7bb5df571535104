pub mod classification;
pub mod customer;
pub mod error;
pub mod ingest_config;
pub mod sheet;
