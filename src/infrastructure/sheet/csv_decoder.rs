// ============================================================
// CSV DECODER
// ============================================================
// Decode CSV uploads with encoding detection and delimiter sniffing

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::EUC_KR;
use tracing::warn;

use crate::domain::error::{AppError, Result};
use crate::domain::sheet::{CellValue, RawRow};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// CSV decoder: first record is the header row, every later record a data row
pub struct CsvDecoder {
    /// Delimiter; `None` sniffs it from the content
    delimiter: Option<u8>,

    /// Whether to trim whitespace around values
    trim: bool,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed delimiter instead of sniffing
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Decode raw upload bytes
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<RawRow>> {
        let content = decode_text(bytes);
        self.parse_content(&content)
    }

    /// Parse already-decoded CSV text
    pub fn parse_content(&self, content: &str) -> Result<Vec<RawRow>> {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true) // short rows pad with empty cells
            .from_reader(content.as_bytes());

        let mut records = reader.records();

        let headers: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| AppError::Decode(format!("Failed to read CSV headers: {}", e)))?
                .iter()
                .map(str::to_string)
                .collect(),
            None => return Err(AppError::EmptyFile),
        };

        let mut rows = Vec::new();
        for (idx, result) in records.enumerate() {
            let record = result.map_err(|e| {
                AppError::Decode(format!("Failed to parse CSV row {}: {}", idx + 1, e))
            })?;
            rows.push(Self::parse_row(idx + 1, &headers, &record));
        }

        if rows.is_empty() {
            return Err(AppError::EmptyFile);
        }

        Ok(rows)
    }

    fn parse_row(index: usize, headers: &[String], record: &StringRecord) -> RawRow {
        let values = record.iter().map(CellValue::from).collect();
        RawRow::from_columns(index, headers, values)
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let candidates = [b',', b';', b'\t', b'|'];
        let sample_lines: Vec<&str> = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(10)
            .collect();

        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &candidates {
            // Byte comparison: UTF-8 continuation bytes never collide with ASCII
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| line.bytes().filter(|&b| b == delimiter).count())
                .collect();

            // Score by consistency (low standard deviation) and frequency
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 (BOM stripped) first; otherwise EUC-KR, which is what Korean office
/// suites write when exporting "CSV (comma delimited)".
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(content) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(content);
    }

    let (content, had_errors) = EUC_KR.decode_without_bom_handling(bytes);
    if had_errors {
        warn!("CSV is neither valid UTF-8 nor EUC-KR; undecodable bytes were replaced");
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "고객명,주소,전화번호\n김철수,Seoul A,010-1234-5678\n이영희, Seoul B ,";
        let rows = CsvDecoder::new().parse_content(content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].get("고객명"), Some(&CellValue::text("김철수")));
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].get("주소"), Some(&CellValue::text("Seoul B")));
        assert_eq!(rows[1].get("전화번호"), Some(&CellValue::empty()));
    }

    #[test]
    fn test_quoted_fields_keep_commas_and_line_breaks() {
        let content = "고객명,\"설치연,월\",\"AS접수\n내용\"\n김철수,2023-12,\"누수, 점검 필요\"";
        let rows = CsvDecoder::new().parse_content(content).unwrap();

        assert_eq!(rows[0].get("설치연,월"), Some(&CellValue::text("2023-12")));
        assert_eq!(
            rows[0].get("AS접수\n내용"),
            Some(&CellValue::text("누수, 점검 필요"))
        );
    }

    #[test]
    fn test_short_rows_pad_with_empty_cells() {
        let rows = CsvDecoder::new()
            .parse_content("a,b,c\n1\n1,2,3,4")
            .unwrap();
        assert_eq!(rows[0].cells.len(), 3);
        assert_eq!(rows[0].get("c"), Some(&CellValue::empty()));
        assert_eq!(rows[1].cells.len(), 3);
    }

    #[test]
    fn test_header_only_is_empty_file() {
        assert!(matches!(
            CsvDecoder::new().parse_content("고객명,주소\n"),
            Err(AppError::EmptyFile)
        ));
        assert!(matches!(
            CsvDecoder::new().parse_content(""),
            Err(AppError::EmptyFile)
        ));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(CsvDecoder::detect_delimiter("a,b,c\nd,e,f"), b',');
        assert_eq!(CsvDecoder::detect_delimiter("a;b;c\nd;e;f"), b';');
        assert_eq!(CsvDecoder::detect_delimiter("고객명\t주소\n김철수\t서울"), b'\t');
    }

    #[test]
    fn test_fixed_delimiter_skips_sniffing() {
        let rows = CsvDecoder::new()
            .with_delimiter(b'|')
            .with_trim(false)
            .parse_content("a,b|c\n1,2|3")
            .unwrap();

        assert_eq!(rows[0].get("a,b"), Some(&CellValue::text("1,2")));
        assert_eq!(rows[0].get("c"), Some(&CellValue::text("3")));
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("고객명,주소\n김철수,Seoul A".as_bytes());

        let rows = CsvDecoder::new().decode(&bytes).unwrap();
        assert_eq!(rows[0].get("고객명"), Some(&CellValue::text("김철수")));
    }

    #[test]
    fn test_euc_kr_fallback() {
        let (bytes, _, _) = EUC_KR.encode("고객명,주소\n김철수,서울특별시");
        let rows = CsvDecoder::new().decode(&bytes).unwrap();
        assert_eq!(rows[0].get("주소"), Some(&CellValue::text("서울특별시")));
    }
}
