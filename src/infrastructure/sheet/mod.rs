// ============================================================
// SHEET INFRASTRUCTURE LAYER
// ============================================================
// Upload decoding: raw bytes + declared format -> RawRow sequence

mod csv_decoder;
mod workbook_decoder;

pub use csv_decoder::CsvDecoder;
pub use workbook_decoder::WorkbookDecoder;

use std::path::Path;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{RawRow, SheetFormat};

/// Decode an upload. Fails as a whole: either every row or an error.
pub fn decode(bytes: &[u8], format: SheetFormat) -> Result<Vec<RawRow>> {
    let rows = match format {
        SheetFormat::Csv => CsvDecoder::new().decode(bytes)?,
        _ => WorkbookDecoder::decode(bytes, format)?,
    };

    // A header followed only by blank rows carries no data either
    if rows.iter().all(RawRow::is_blank) {
        return Err(AppError::EmptyFile);
    }

    info!(format = %format, rows = rows.len(), "Decoded upload");
    Ok(rows)
}

/// Read and decode a file, inferring the format from its extension
pub fn decode_file(path: &Path) -> Result<Vec<RawRow>> {
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;
    decode(&bytes, format)
}
