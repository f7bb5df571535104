// ============================================================
// CLASSIFICATION TYPES
// ============================================================
// Per-row validation outcomes and the summaries shown before/after commit

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::customer::CanonicalRecord;

pub const ERR_CUSTOMER_NAME_REQUIRED: &str = "customer name is required";
pub const ERR_ADDRESS_REQUIRED: &str = "address is required";
pub const ERR_INVALID_PHONE: &str = "invalid phone number format";

/// Why a row was set aside as a duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicateReason {
    #[serde(rename = "already registered in database")]
    AlreadyRegistered,
    #[serde(rename = "duplicate within this upload")]
    DuplicateInUpload,
}

impl DuplicateReason {
    pub fn message(&self) -> &'static str {
        match self {
            DuplicateReason::AlreadyRegistered => "already registered in database",
            DuplicateReason::DuplicateInUpload => "duplicate within this upload",
        }
    }
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Exactly one bucket per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Valid,
    Invalid { errors: Vec<String> },
    Duplicate { reason: DuplicateReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedRow {
    /// 1-based position in the upload
    pub row_index: usize,
    pub record: CanonicalRecord,
    #[serde(flatten)]
    pub status: RowStatus,
}

impl ClassifiedRow {
    pub fn is_valid(&self) -> bool {
        matches!(self.status, RowStatus::Valid)
    }

    pub fn errors(&self) -> &[String] {
        match &self.status {
            RowStatus::Invalid { errors } => errors,
            _ => &[],
        }
    }

    pub fn reason(&self) -> Option<DuplicateReason> {
        match self.status {
            RowStatus::Duplicate { reason } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize,
}

/// Classified rows split into their three buckets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub summary: ValidationSummary,
    pub valid_rows: Vec<ClassifiedRow>,
    pub invalid_rows: Vec<ClassifiedRow>,
    pub duplicates: Vec<ClassifiedRow>,
}

impl ValidationReport {
    /// Route a classified row into its bucket and keep the tallies in step
    pub fn push(&mut self, row: ClassifiedRow) {
        self.summary.total += 1;
        match row.status {
            RowStatus::Valid => {
                self.summary.valid += 1;
                self.valid_rows.push(row);
            }
            RowStatus::Invalid { .. } => {
                self.summary.invalid += 1;
                self.invalid_rows.push(row);
            }
            RowStatus::Duplicate { .. } => {
                self.summary.duplicates += 1;
                self.duplicates.push(row);
            }
        }
    }
}

/// Preview handed to the UI before anything is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub upload_id: Uuid,
    /// Rows removed by the normalizer's row filter before validation
    pub dropped_rows: usize,
    pub report: ValidationReport,
}

/// Result of the commit stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// Rows stored without coordinates
    pub geocode_failed: usize,
}
