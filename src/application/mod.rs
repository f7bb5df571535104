pub mod use_cases;

pub use use_cases::commit_stage::CommitStage;
pub use use_cases::customer_import::CustomerImport;
pub use use_cases::field_normalizer::FieldNormalizer;
pub use use_cases::record_validator::RecordValidator;
