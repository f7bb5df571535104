use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::domain::error::AppError;

/// Declared encoding of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    Csv,
    Xlsx,
    Xls,
    Xlsb,
    Ods,
}

impl SheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Xls => "xls",
            SheetFormat::Xlsb => "xlsb",
            SheetFormat::Ods => "ods",
        }
    }

    /// Binary workbook formats (everything except CSV)
    pub fn is_workbook(&self) -> bool {
        !matches!(self, SheetFormat::Csv)
    }

    /// Infer the format from a file name or path
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                AppError::UnsupportedFormat(format!("no file extension: {}", path.display()))
            })?;
        ext.parse()
    }
}

impl FromStr for SheetFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "txt" => Ok(SheetFormat::Csv),
            "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "xlsb" => Ok(SheetFormat::Xlsb),
            "ods" => Ok(SheetFormat::Ods),
            other => Err(AppError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            SheetFormat::from_path(Path::new("/tmp/고객목록.XLSX")).unwrap(),
            SheetFormat::Xlsx
        );
        assert_eq!(
            SheetFormat::from_path(Path::new("upload.csv")).unwrap(),
            SheetFormat::Csv
        );
        assert!(SheetFormat::from_path(Path::new("noext")).is_err());
        assert!(matches!(
            SheetFormat::from_path(Path::new("scan.pdf")),
            Err(AppError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_is_workbook() {
        assert!(!SheetFormat::Csv.is_workbook());
        assert!(SheetFormat::Xls.is_workbook());
    }
}
