use serde::{Deserialize, Serialize};

/// A single decoded cell.
///
/// CSV cells are always `Text`; workbook cells keep their numeric type so the
/// date normalizer can tell a date serial apart from a date string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// The empty cell. Empty cells are empty text, never a missing value.
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Whether the cell carries no usable content
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Number(n) => !n.is_finite(),
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Render the cell as trimmed text.
    /// Integral numbers print without a fractional part (`42`, not `42.0`).
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Number(n) => format_number(*n),
            CellValue::Text(s) => s.trim().to_string(),
        }
    }

    /// Non-empty trimmed text, or `None`
    pub fn non_empty_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_text())
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
