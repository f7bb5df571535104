// ============================================================
// WORKBOOK DECODER
// ============================================================
// Decode the first worksheet of an xlsx/xls/xlsb/ods upload from memory

use std::io::Cursor;

use calamine::{Data, Ods, Range, Reader, Xls, Xlsb, Xlsx};

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{CellValue, RawRow, SheetFormat};

pub struct WorkbookDecoder;

impl WorkbookDecoder {
    /// Decode workbook bytes. The first row of the first sheet is the header row.
    pub fn decode(bytes: &[u8], format: SheetFormat) -> Result<Vec<RawRow>> {
        let range = Self::first_sheet(bytes, format)?;
        Self::rows_from_range(&range)
    }

    fn first_sheet(bytes: &[u8], format: SheetFormat) -> Result<Range<Data>> {
        match format {
            SheetFormat::Xlsx => first_range::<Xlsx<_>>(bytes, format),
            SheetFormat::Xls => first_range::<Xls<_>>(bytes, format),
            SheetFormat::Xlsb => first_range::<Xlsb<_>>(bytes, format),
            SheetFormat::Ods => first_range::<Ods<_>>(bytes, format),
            SheetFormat::Csv => Err(AppError::UnsupportedFormat(
                "csv is not a workbook format".to_string(),
            )),
        }
    }

    /// Convert a worksheet range into raw rows
    pub fn rows_from_range(range: &Range<Data>) -> Result<Vec<RawRow>> {
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_label).collect(),
            None => return Err(AppError::EmptyFile),
        };

        let decoded: Vec<RawRow> = rows
            .enumerate()
            .map(|(idx, row)| {
                let values = row.iter().map(cell_value).collect();
                RawRow::from_columns(idx + 1, &headers, values)
            })
            .collect();

        if decoded.is_empty() {
            return Err(AppError::EmptyFile);
        }

        Ok(decoded)
    }
}

fn first_range<'a, R>(bytes: &'a [u8], format: SheetFormat) -> Result<Range<Data>>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: std::fmt::Display,
{
    let mut workbook = R::new(Cursor::new(bytes))
        .map_err(|e| AppError::Decode(format!("Failed to open {} workbook: {}", format, e)))?;

    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Decode("No worksheet found".to_string()))?
        .map_err(|e| AppError::Decode(format!("Failed to read worksheet range: {}", e)))
}

/// Header labels keep their original text, line breaks included
fn header_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_value(other).to_text(),
    }
}

/// Empty and error cells decode to empty text; dates decode to their serial
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        // ISO datetimes (ods) keep only the date part
        Data::DateTimeIso(s) => CellValue::Text(s.split('T').next().unwrap_or_default().to_string()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::empty(),
        #[allow(unreachable_patterns)]
        _ => CellValue::empty(),
    }
}
