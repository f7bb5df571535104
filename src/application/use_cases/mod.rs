pub mod commit_stage;
pub mod customer_import;
pub mod date_normalizer;
pub mod field_normalizer;
pub mod header_mapping;
pub mod record_validator;
