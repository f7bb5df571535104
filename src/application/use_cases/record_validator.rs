//! Record validation and duplicate detection.
//!
//! One forward pass over the upload. Every row lands in exactly one of the
//! valid / invalid / duplicate buckets, so the summary always adds up.
//! Duplicates are detected by exact address match against the persisted
//! snapshot first, then against earlier rows of the same upload. The
//! `seen_in_batch` set lives only for one `validate_rows` call.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};

use super::field_normalizer::NormalizedRow;
use crate::domain::classification::{
    ClassifiedRow, DuplicateReason, RowStatus, ValidationReport, ERR_ADDRESS_REQUIRED,
    ERR_CUSTOMER_NAME_REQUIRED, ERR_INVALID_PHONE,
};
use crate::domain::customer::CanonicalRecord;
use crate::domain::ingest_config::Precedence;

static MOBILE_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^01[0-9]-?[0-9]{3,4}-?[0-9]{4}$").unwrap());

/// Korean mobile number check; hyphens are stripped before matching
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.trim().chars().filter(|c| *c != '-').collect();
    MOBILE_PHONE.is_match(&digits)
}

#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    precedence: Precedence,
}

impl RecordValidator {
    pub fn new(precedence: Precedence) -> Self {
        Self { precedence }
    }

    /// Classify records in upload order; row indexes are assigned 1-based
    /// from their position in `records`.
    pub fn validate(
        &self,
        records: Vec<CanonicalRecord>,
        existing_addresses: &HashSet<String>,
    ) -> ValidationReport {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| NormalizedRow {
                row_index: i + 1,
                record,
            })
            .collect();
        self.validate_rows(rows, existing_addresses)
    }

    /// Classify normalized rows, keeping the row indexes they carry
    pub fn validate_rows(
        &self,
        rows: Vec<NormalizedRow>,
        existing_addresses: &HashSet<String>,
    ) -> ValidationReport {
        let mut seen_in_batch: HashSet<String> = HashSet::new();
        let mut report = ValidationReport::default();

        for NormalizedRow { row_index, record } in rows {
            let errors = field_errors(&record);
            let duplicate = duplicate_reason(&record, existing_addresses, &mut seen_in_batch);

            let status = match (self.precedence, duplicate, errors.is_empty()) {
                (Precedence::DuplicateFirst, Some(reason), _) => RowStatus::Duplicate { reason },
                (Precedence::ErrorsFirst, Some(reason), true) => RowStatus::Duplicate { reason },
                (_, _, false) => RowStatus::Invalid { errors },
                (_, None, true) => RowStatus::Valid,
            };

            debug!(row_index, status = ?status, "Row classified");
            report.push(ClassifiedRow {
                row_index,
                record,
                status,
            });
        }

        info!(
            total = report.summary.total,
            valid = report.summary.valid,
            invalid = report.summary.invalid,
            duplicates = report.summary.duplicates,
            "Validation complete"
        );

        report
    }
}

fn field_errors(record: &CanonicalRecord) -> Vec<String> {
    let mut errors = Vec::new();

    if !record.has_customer_name() {
        errors.push(ERR_CUSTOMER_NAME_REQUIRED.to_string());
    }
    if !record.has_address() {
        errors.push(ERR_ADDRESS_REQUIRED.to_string());
    }
    if let Some(phone) = record.phone.as_deref() {
        if !phone.trim().is_empty() && !is_valid_phone(phone) {
            errors.push(ERR_INVALID_PHONE.to_string());
        }
    }

    errors
}

/// Check both duplicate sources. A fresh, non-empty address is remembered
/// for the rest of the upload.
fn duplicate_reason(
    record: &CanonicalRecord,
    existing_addresses: &HashSet<String>,
    seen_in_batch: &mut HashSet<String>,
) -> Option<DuplicateReason> {
    if !record.has_address() {
        return None;
    }
    if existing_addresses.contains(&record.address) {
        return Some(DuplicateReason::AlreadyRegistered);
    }
    if seen_in_batch.contains(&record.address) {
        return Some(DuplicateReason::DuplicateInUpload);
    }
    seen_in_batch.insert(record.address.clone());
    None
}
