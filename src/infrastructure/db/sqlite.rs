use crate::domain::customer::{CanonicalRecord, EnrichedRecord, PersistOutcome, StoredCustomer};
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use tracing::{info, warn};

use super::CustomerStore;

const CUSTOMERS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS customers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    row_index INTEGER NOT NULL,
    sequence INTEGER,
    \"count\" INTEGER,
    receipt_date TEXT,
    company TEXT,
    category TEXT,
    customer_name TEXT NOT NULL,
    phone TEXT,
    install_date TEXT,
    heat_source TEXT,
    address TEXT NOT NULL,
    as_content TEXT,
    install_team TEXT,
    region TEXT,
    receptionist TEXT,
    as_result TEXT,
    extras TEXT,
    latitude REAL,
    longitude REAL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

/// SQLite-backed customer store.
/// Addresses are not unique at the schema level; duplicates are a reported
/// warning in the import preview, not a constraint.
pub struct SqliteCustomerStore {
    pool: Pool<Sqlite>,
}

impl SqliteCustomerStore {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        // Every connection to `:memory:` is its own database, so keep exactly one alive
        let in_memory = database_url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(CUSTOMERS_SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_customers_address ON customers(address)")
            .execute(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;

        info!(database_url, "Customer store ready");
        Ok(Self { pool })
    }

    async fn insert(&self, customer: &EnrichedRecord) -> Result<i64> {
        let r = &customer.record;
        let extras = if r.extras.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&r.extras).map_err(|e| {
                AppError::Internal(format!("Failed to encode extra columns: {}", e))
            })?)
        };

        let result = sqlx::query(
            "INSERT INTO customers (
                row_index, sequence, \"count\", receipt_date, company, category,
                customer_name, phone, install_date, heat_source, address, as_content,
                install_team, region, receptionist, as_result, extras, latitude, longitude
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(customer.row_index as i64)
        .bind(r.sequence)
        .bind(r.count)
        .bind(r.receipt_date)
        .bind(&r.company)
        .bind(&r.category)
        .bind(&r.customer_name)
        .bind(&r.phone)
        .bind(r.install_date)
        .bind(&r.heat_source)
        .bind(&r.address)
        .bind(&r.as_content)
        .bind(&r.install_team)
        .bind(&r.region)
        .bind(&r.receptionist)
        .bind(&r.as_result)
        .bind(extras)
        .bind(customer.latitude)
        .bind(customer.longitude)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert customer: {}", e)))?;

        Ok(result.last_insert_rowid())
    }

    /// All stored customers, oldest first
    pub async fn list_customers(&self) -> Result<Vec<StoredCustomer>> {
        sqlx::query_as::<_, CustomerEntity>(
            "SELECT id, row_index, sequence, \"count\", receipt_date, company, category,
                    customer_name, phone, install_date, heat_source, address, as_content,
                    install_team, region, receptionist, as_result, extras, latitude, longitude
             FROM customers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch customers: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }
}

#[async_trait]
impl CustomerStore for SqliteCustomerStore {
    async fn load_existing_addresses(&self) -> Result<HashSet<String>> {
        let addresses: Vec<String> = sqlx::query_scalar("SELECT DISTINCT address FROM customers")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to load addresses: {}", e)))?;

        Ok(addresses.into_iter().collect())
    }

    async fn persist(&self, records: Vec<EnrichedRecord>) -> Result<PersistOutcome> {
        let mut outcome = PersistOutcome::default();

        for record in records {
            match self.insert(&record).await {
                Ok(id) => {
                    outcome.inserted_count += 1;
                    outcome.inserted_records.push(StoredCustomer { id, customer: record });
                }
                Err(err) => {
                    warn!(row_index = record.row_index, error = %err, "Customer insert failed");
                }
            }
        }

        Ok(outcome)
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM customers WHERE id IN ({})", placeholders);
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete customers: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count customers: {}", e)))
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct CustomerEntity {
    id: i64,
    row_index: i64,
    sequence: Option<i64>,
    count: Option<i64>,
    receipt_date: Option<NaiveDate>,
    company: Option<String>,
    category: Option<String>,
    customer_name: String,
    phone: Option<String>,
    install_date: Option<NaiveDate>,
    heat_source: Option<String>,
    address: String,
    as_content: Option<String>,
    install_team: Option<String>,
    region: Option<String>,
    receptionist: Option<String>,
    as_result: Option<String>,
    extras: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<CustomerEntity> for StoredCustomer {
    fn from(e: CustomerEntity) -> Self {
        let extras: BTreeMap<String, String> = e
            .extras
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();

        Self {
            id: e.id,
            customer: EnrichedRecord {
                row_index: e.row_index as usize,
                record: CanonicalRecord {
                    sequence: e.sequence,
                    count: e.count,
                    receipt_date: e.receipt_date,
                    company: e.company,
                    category: e.category,
                    customer_name: e.customer_name,
                    phone: e.phone,
                    install_date: e.install_date,
                    heat_source: e.heat_source,
                    address: e.address,
                    as_content: e.as_content,
                    install_team: e.install_team,
                    region: e.region,
                    receptionist: e.receptionist,
                    as_result: e.as_result,
                    extras,
                },
                latitude: e.latitude,
                longitude: e.longitude,
            },
        }
    }
}
