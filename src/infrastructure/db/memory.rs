use crate::domain::customer::{EnrichedRecord, PersistOutcome, StoredCustomer};
use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use super::CustomerStore;

#[derive(Default)]
struct MemoryState {
    customers: Vec<StoredCustomer>,
    seeded_addresses: HashSet<String>,
    next_id: i64,
}

/// Process-local store, used when no database is configured and in tests
#[derive(Default)]
pub struct InMemoryCustomerStore {
    state: Mutex<MemoryState>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend these addresses were stored by an earlier upload
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.seeded_addresses = addresses.into_iter().map(Into::into).collect();
        }
        store
    }

    pub fn snapshot(&self) -> Vec<StoredCustomer> {
        self.state
            .lock()
            .map(|state| state.customers.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("customer store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn load_existing_addresses(&self) -> Result<HashSet<String>> {
        let state = self.lock()?;
        let mut addresses = state.seeded_addresses.clone();
        addresses.extend(state.customers.iter().map(|c| c.customer.record.address.clone()));
        Ok(addresses)
    }

    async fn persist(&self, records: Vec<EnrichedRecord>) -> Result<PersistOutcome> {
        let mut state = self.lock()?;
        let mut outcome = PersistOutcome::default();

        for record in records {
            state.next_id += 1;
            let stored = StoredCustomer {
                id: state.next_id,
                customer: record,
            };
            state.customers.push(stored.clone());
            outcome.inserted_records.push(stored);
        }

        outcome.inserted_count = outcome.inserted_records.len();
        Ok(outcome)
    }

    async fn delete_by_ids(&self, ids: &[i64]) -> Result<u64> {
        let mut state = self.lock()?;
        let before = state.customers.len();
        state.customers.retain(|c| !ids.contains(&c.id));
        Ok((before - state.customers.len()) as u64)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.lock()?.customers.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customer::CanonicalRecord;

    #[tokio::test]
    async fn test_seeded_addresses_are_reported() {
        let store = InMemoryCustomerStore::with_addresses(["Seoul A"]);
        let addresses = store.load_existing_addresses().await.unwrap();
        assert!(addresses.contains("Seoul A"));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_assigns_increasing_ids() {
        let store = InMemoryCustomerStore::new();
        let outcome = store
            .persist(vec![
                EnrichedRecord::new(1, CanonicalRecord::new("a", "Seoul A"), None),
                EnrichedRecord::new(2, CanonicalRecord::new("b", "Seoul B"), None),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.inserted_count, 2);
        let ids: Vec<i64> = outcome.inserted_records.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(store.load_existing_addresses().await.unwrap().contains("Seoul B"));

        assert_eq!(store.delete_by_ids(&[1]).await.unwrap(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }
}
