//! Date cell normalization.
//!
//! Accepted encodings, in order:
//! - numeric cells: spreadsheet date serial (25569 == 1970-01-01)
//! - `YYYY-MM-DD`, `YYYY.MM.DD`, `YYYY/MM/DD` with 1 or 2 digit month/day
//! - `YYYY-MM`, `YYYY.MM`, `YYYY/MM` (day becomes the 1st)
//!
//! Anything else, including impossible calendar dates, yields `None`.
//! Text already shaped like `YYYY-MM-DD` is still checked against the
//! calendar rather than passed through, so `2024-02-30` is rejected.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::sheet::CellValue;

/// Serial number of 1970-01-01 in the 1900 date system
pub const UNIX_EPOCH_SERIAL: i64 = 25569;

/// Serial of 9999-12-31; larger values cannot be a calendar date
const MAX_SERIAL: f64 = 2_958_465.0;

static FULL_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})\s*[-./]\s*(\d{1,2})\s*[-./]\s*(\d{1,2})\.?$").unwrap()
});

static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\s*[-./]\s*(\d{1,2})\.?$").unwrap());

/// Normalize a date-like cell
pub fn normalize_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(serial) => from_serial(*serial),
        CellValue::Text(text) => parse_date_text(text),
    }
}

/// Same as [`normalize_date`], rendered as `YYYY-MM-DD`
pub fn normalize_date_string(value: &CellValue) -> Option<String> {
    normalize_date(value).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Convert a spreadsheet serial (fraction = time of day, ignored)
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.floor() as i64 - UNIX_EPOCH_SERIAL;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = FULL_DATE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = YEAR_MONTH.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    None
}
