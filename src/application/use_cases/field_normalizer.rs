// ============================================================
// FIELD NORMALIZER
// ============================================================
// Map decoded rows onto the canonical customer schema

use tracing::debug;

use super::date_normalizer::normalize_date;
use super::header_mapping::{map_header, HeaderKey};
use crate::domain::customer::{CanonicalRecord, CustomerField};
use crate::domain::ingest_config::RowFilter;
use crate::domain::sheet::{CellValue, RawRow};

/// A canonical record still tied to its position in the upload
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub row_index: usize,
    pub record: CanonicalRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub rows: Vec<NormalizedRow>,
    /// Rows removed by the row filter
    pub dropped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FieldNormalizer {
    row_filter: RowFilter,
}

impl FieldNormalizer {
    pub fn new(row_filter: RowFilter) -> Self {
        Self { row_filter }
    }

    /// Normalize every row, dropping the ones the row filter rejects
    pub fn normalize(&self, rows: Vec<RawRow>) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();

        for row in rows {
            if row.is_blank() {
                debug!(row_index = row.index, "Dropping blank row");
                batch.dropped += 1;
                continue;
            }

            let record = self.normalize_row(&row);

            if self.row_filter == RowFilter::MissingCustomerName && !record.has_customer_name() {
                debug!(row_index = row.index, "Dropping row without customer name");
                batch.dropped += 1;
                continue;
            }

            batch.rows.push(NormalizedRow {
                row_index: row.index,
                record,
            });
        }

        batch
    }

    /// Map one row. When two columns land on the same field, the first
    /// non-empty value wins.
    pub fn normalize_row(&self, row: &RawRow) -> CanonicalRecord {
        let mut record = CanonicalRecord::default();

        for (header, value) in &row.cells {
            // Values under a blank header cell have nowhere to go
            if value.is_empty() || header.trim().is_empty() {
                continue;
            }
            match map_header(header) {
                HeaderKey::Field(field) => assign(&mut record, field, value),
                HeaderKey::Extra(key) => {
                    record.extras.entry(key).or_insert_with(|| value.to_text());
                }
            }
        }

        record
    }
}

fn assign(record: &mut CanonicalRecord, field: CustomerField, value: &CellValue) {
    fn set_text(slot: &mut Option<String>, value: &CellValue) {
        if slot.is_none() {
            *slot = value.non_empty_text();
        }
    }

    match field {
        CustomerField::Sequence => {
            if record.sequence.is_none() {
                record.sequence = parse_integer(value);
            }
        }
        CustomerField::Count => {
            if record.count.is_none() {
                record.count = parse_integer(value);
            }
        }
        CustomerField::ReceiptDate => {
            if record.receipt_date.is_none() {
                record.receipt_date = normalize_date(value);
            }
        }
        CustomerField::InstallDate => {
            if record.install_date.is_none() {
                record.install_date = normalize_date(value);
            }
        }
        CustomerField::CustomerName => {
            if !record.has_customer_name() {
                record.customer_name = value.to_text();
            }
        }
        CustomerField::Address => {
            if !record.has_address() {
                record.address = value.to_text();
            }
        }
        CustomerField::Company => set_text(&mut record.company, value),
        CustomerField::Category => set_text(&mut record.category, value),
        CustomerField::Phone => set_text(&mut record.phone, value),
        CustomerField::HeatSource => set_text(&mut record.heat_source, value),
        CustomerField::AsContent => set_text(&mut record.as_content, value),
        CustomerField::InstallTeam => set_text(&mut record.install_team, value),
        CustomerField::Region => set_text(&mut record.region, value),
        CustomerField::Receptionist => set_text(&mut record.receptionist, value),
        CustomerField::AsResult => set_text(&mut record.as_result, value),
    }
}

/// Integer cells: numbers with no fractional part, or integer text
/// (thousands separators allowed)
pub fn parse_integer(value: &CellValue) -> Option<i64> {
    match value {
        CellValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as i64),
        CellValue::Number(_) => None,
        CellValue::Text(text) => {
            let cleaned = text.trim().replace(',', "");
            cleaned.parse::<i64>().ok().or_else(|| {
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite() && n.fract() == 0.0)
                    .map(|n| n as i64)
            })
        }
    }
}
