use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical customer fields, in the column order of the import template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerField {
    Sequence,
    Count,
    ReceiptDate,
    Company,
    Category,
    CustomerName,
    Phone,
    InstallDate,
    HeatSource,
    Address,
    AsContent,
    InstallTeam,
    Region,
    Receptionist,
    AsResult,
}

impl CustomerField {
    pub const ALL: [CustomerField; 15] = [
        CustomerField::Sequence,
        CustomerField::Count,
        CustomerField::ReceiptDate,
        CustomerField::Company,
        CustomerField::Category,
        CustomerField::CustomerName,
        CustomerField::Phone,
        CustomerField::InstallDate,
        CustomerField::HeatSource,
        CustomerField::Address,
        CustomerField::AsContent,
        CustomerField::InstallTeam,
        CustomerField::Region,
        CustomerField::Receptionist,
        CustomerField::AsResult,
    ];

    /// Canonical key, also the storage column name
    pub fn key(&self) -> &'static str {
        match self {
            CustomerField::Sequence => "sequence",
            CustomerField::Count => "count",
            CustomerField::ReceiptDate => "receipt_date",
            CustomerField::Company => "company",
            CustomerField::Category => "category",
            CustomerField::CustomerName => "customer_name",
            CustomerField::Phone => "phone",
            CustomerField::InstallDate => "install_date",
            CustomerField::HeatSource => "heat_source",
            CustomerField::Address => "address",
            CustomerField::AsContent => "as_content",
            CustomerField::InstallTeam => "install_team",
            CustomerField::Region => "region",
            CustomerField::Receptionist => "receptionist",
            CustomerField::AsResult => "as_result",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for CustomerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A row remapped onto the fixed customer schema.
///
/// `customer_name` and `address` are plain strings because a record can still
/// be in progress here: the validator decides whether an empty value is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub sequence: Option<i64>,
    pub count: Option<i64>,
    pub receipt_date: Option<NaiveDate>,
    pub company: Option<String>,
    pub category: Option<String>,
    pub customer_name: String,
    pub phone: Option<String>,
    pub install_date: Option<NaiveDate>,
    pub heat_source: Option<String>,
    pub address: String,
    pub as_content: Option<String>,
    pub install_team: Option<String>,
    pub region: Option<String>,
    pub receptionist: Option<String>,
    pub as_result: Option<String>,

    /// Columns that matched no known header, under their derived key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl CanonicalRecord {
    pub fn new(customer_name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            customer_name: customer_name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn has_customer_name(&self) -> bool {
        !self.customer_name.trim().is_empty()
    }

    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

/// Resolved location of an address (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A valid record ready for persistence.
/// Coordinates stay `None` when geocoding failed for this row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRecord {
    pub row_index: usize,
    pub record: CanonicalRecord,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl EnrichedRecord {
    pub fn new(row_index: usize, record: CanonicalRecord, coordinates: Option<Coordinates>) -> Self {
        Self {
            row_index,
            record,
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
        }
    }

    pub fn is_geocoded(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// A record as stored by the customer store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCustomer {
    pub id: i64,
    #[serde(flatten)]
    pub customer: EnrichedRecord,
}

/// What `persist` reports back: how many rows actually landed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistOutcome {
    pub inserted_count: usize,
    pub inserted_records: Vec<StoredCustomer>,
}
