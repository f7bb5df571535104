pub mod memory;
pub mod sqlite;

use crate::domain::customer::{EnrichedRecord, PersistOutcome};
use crate::domain::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;

pub use memory::InMemoryCustomerStore;
pub use sqlite::SqliteCustomerStore;

/// Persisted customer dataset as seen by the import pipeline
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Snapshot of every stored address, read once per validation run
    async fn load_existing_addresses(&self) -> Result<HashSet<String>>;

    /// Insert records. Individual row failures are skipped, so
    /// `inserted_count` may be lower than `records.len()`.
    async fn persist(&self, records: Vec<EnrichedRecord>) -> Result<PersistOutcome>;

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64>;

    async fn count(&self) -> Result<i64>;
}
