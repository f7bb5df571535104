//! Header label → canonical field mapping.
//!
//! Uploaded sheets come from several offices, each with its own spelling of
//! the same column ("AS접수내용" vs "A/S접수내용", "설치연월" vs "설치연,월",
//! labels wrapped across two lines in the header cell). Lookup is by exact
//! string match against a fixed synonym table:
//! 1. the label with CR/LF/tab and every other whitespace removed,
//! 2. the label exactly as written,
//! 3. otherwise a derived key (lowercase, non-alphanumerics → `_`). A derived
//!    key that names a canonical field ("Customer Name" → `customer_name`)
//!    fills that field; any other derived key is kept as an extra column.
//!
//! No synonym key contains whitespace, so step 2 only matters if one is
//! added later. It is kept so labels are always tried verbatim as well.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::domain::customer::CustomerField;

/// Where a header's values end up in the canonical record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    Field(CustomerField),
    /// Unknown column, kept under its derived key
    Extra(String),
}

static SYNONYMS: Lazy<HashMap<&'static str, CustomerField>> = Lazy::new(|| {
    use CustomerField::*;

    let mut m = HashMap::new();
    let entries: &[(&str, CustomerField)] = &[
        ("순번", Sequence),
        ("번호", Sequence),
        ("횟수", Count),
        ("접수일자", ReceiptDate),
        ("접수일", ReceiptDate),
        ("업체", Company),
        ("업체명", Company),
        ("구분", Category),
        ("고객명", CustomerName),
        ("고객이름", CustomerName),
        ("전화번호", Phone),
        ("연락처", Phone),
        ("설치연월", InstallDate),
        ("설치연,월", InstallDate),
        ("설치연/월", InstallDate),
        ("설치일자", InstallDate),
        ("열원", HeatSource),
        ("주소", Address),
        ("AS접수내용", AsContent),
        ("A/S접수내용", AsContent),
        ("설치팀", InstallTeam),
        ("지역", Region),
        ("접수자", Receptionist),
        ("AS결과", AsResult),
        ("A/S결과", AsResult),
    ];
    for (label, field) in entries {
        m.insert(*label, *field);
    }
    // Canonical keys map to themselves so already-normalized exports round-trip
    for field in CustomerField::ALL {
        m.insert(field.key(), field);
    }
    m
});

/// Remove line breaks, tabs and all other whitespace from a header label
pub fn clean_header(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t') && !c.is_whitespace())
        .collect()
}

/// Fallback key for headers outside the synonym table
pub fn derive_key(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                '_'
            }
        })
        .collect()
}

/// Look up a synonym without falling back to a derived key
pub fn lookup_field(label: &str) -> Option<CustomerField> {
    let cleaned = clean_header(label);
    SYNONYMS
        .get(cleaned.as_str())
        .or_else(|| SYNONYMS.get(label))
        .copied()
}

/// Resolve a raw header label to its canonical destination
pub fn map_header(label: &str) -> HeaderKey {
    if let Some(field) = lookup_field(label) {
        return HeaderKey::Field(field);
    }

    let derived = derive_key(label.trim());
    match CustomerField::from_key(&derived) {
        Some(field) => HeaderKey::Field(field),
        None => HeaderKey::Extra(derived),
    }
}
