use serde::{Deserialize, Serialize};

use super::CellValue;

/// One decoded data row, keyed by the header labels exactly as written in the
/// uploaded file (line breaks and spaces included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based position among the data rows of the upload
    pub index: usize,

    /// Header label and cell value, in column order
    pub cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(index: usize, cells: Vec<(String, CellValue)>) -> Self {
        Self { index, cells }
    }

    /// Build a row by zipping headers with values.
    /// Missing trailing values decode as empty cells.
    pub fn from_columns(index: usize, headers: &[String], values: Vec<CellValue>) -> Self {
        let mut values = values.into_iter();
        let cells = headers
            .iter()
            .map(|h| (h.clone(), values.next().unwrap_or_else(CellValue::empty)))
            .collect();
        Self { index, cells }
    }

    /// Value under an exact header label
    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    /// True when every cell is empty
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_pads_missing_values() {
        let headers = vec!["고객명".to_string(), "주소".to_string(), "전화번호".to_string()];
        let row = RawRow::from_columns(1, &headers, vec![CellValue::text("김철수")]);

        assert_eq!(row.cells.len(), 3);
        assert_eq!(row.get("고객명"), Some(&CellValue::text("김철수")));
        assert_eq!(row.get("전화번호"), Some(&CellValue::empty()));
        assert_eq!(row.get("없음"), None);
    }

    #[test]
    fn test_is_blank() {
        let headers = vec!["a".to_string(), "b".to_string()];
        assert!(RawRow::from_columns(1, &headers, vec![]).is_blank());
        assert!(!RawRow::from_columns(1, &headers, vec![CellValue::Number(3.0)]).is_blank());
    }
}
