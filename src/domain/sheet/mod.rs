// ============================================================
// SHEET DOMAIN LAYER
// ============================================================
// Decoded spreadsheet values, independent of the source encoding
// No I/O, no async

mod cell;
mod format;
mod raw_row;

pub use cell::CellValue;
pub use format::SheetFormat;
pub use raw_row::RawRow;
