// ============================================================
// COMMIT STAGE
// ============================================================
// Geocodes the valid bucket with a bounded fan-out, then persists.
// A failed lookup only costs that row its coordinates.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::classification::{ClassifiedRow, UploadResult};
use crate::domain::customer::{Coordinates, EnrichedRecord};
use crate::domain::error::Result;
use crate::infrastructure::db::CustomerStore;
use crate::infrastructure::geocoding::Geocoder;

pub const DEFAULT_GEOCODE_CONCURRENCY: usize = 8;

pub struct CommitStage {
    geocoder: Arc<dyn Geocoder>,
    store: Arc<dyn CustomerStore>,
    concurrency: usize,
    default_receipt_date_to_today: bool,
}

impl CommitStage {
    pub fn new(geocoder: Arc<dyn Geocoder>, store: Arc<dyn CustomerStore>, concurrency: usize) -> Self {
        Self {
            geocoder,
            store,
            concurrency: concurrency.max(1),
            default_receipt_date_to_today: true,
        }
    }

    pub fn with_receipt_date_default(mut self, enabled: bool) -> Self {
        self.default_receipt_date_to_today = enabled;
        self
    }

    /// Geocode and persist the valid rows.
    ///
    /// Rows that are not classified valid are skipped with a warning.
    /// Records reach the store in `row_index` order whatever order the
    /// lookups finish in.
    pub async fn commit(&self, rows: &[ClassifiedRow]) -> Result<UploadResult> {
        self.commit_on(rows, Local::now().date_naive()).await
    }

    pub(crate) async fn commit_on(&self, rows: &[ClassifiedRow], today: NaiveDate) -> Result<UploadResult> {
        let mut valid: Vec<&ClassifiedRow> = rows
            .iter()
            .filter(|row| {
                if !row.is_valid() {
                    warn!(row_index = row.row_index, "Skipping row that is not valid");
                }
                row.is_valid()
            })
            .collect();
        valid.sort_by_key(|row| row.row_index);

        let addresses = valid.iter().map(|row| row.record.address.clone()).collect();
        let coordinates = self.geocode_all(addresses).await;
        let geocode_failed = coordinates.iter().filter(|c| c.is_none()).count();

        let records: Vec<EnrichedRecord> = valid
            .into_iter()
            .zip(coordinates)
            .map(|(row, coords)| {
                let mut record = row.record.clone();
                if self.default_receipt_date_to_today && record.receipt_date.is_none() {
                    record.receipt_date = Some(today);
                }
                EnrichedRecord::new(row.row_index, record, coords)
            })
            .collect();

        let total = records.len();
        let outcome = self.store.persist(records).await?;
        let success = outcome.inserted_count.min(total);

        let result = UploadResult {
            total,
            success,
            failed: total - success,
            geocode_failed,
        };

        info!(
            total = result.total,
            success = result.success,
            failed = result.failed,
            geocode_failed = result.geocode_failed,
            "Upload committed"
        );

        Ok(result)
    }

    /// Look up every address with at most `concurrency` requests in flight.
    /// The output is positional: `result[i]` belongs to `addresses[i]`.
    pub async fn geocode_all(&self, addresses: Vec<String>) -> Vec<Option<Coordinates>> {
        let mut results = vec![None; addresses.len()];
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (pos, address) in addresses.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let geocoder = Arc::clone(&self.geocoder);

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (pos, None);
                };

                match geocoder.geocode(&address).await {
                    Ok(Some(coords)) => (pos, Some(coords)),
                    Ok(None) => {
                        debug!(address = %address, "Address not found by geocoder");
                        (pos, None)
                    }
                    Err(err) => {
                        warn!(address = %address, error = %err, "Geocoding failed");
                        (pos, None)
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((pos, coords)) => results[pos] = coords,
                Err(err) => warn!(error = %err, "Geocode task aborted"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::{DuplicateReason, RowStatus};
    use crate::domain::customer::{CanonicalRecord, PersistOutcome, StoredCustomer};
    use crate::domain::error::AppError;
    use crate::infrastructure::db::InMemoryCustomerStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedGeocoder;

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
            if address.contains("unknown") {
                return Ok(None);
            }
            if address.contains("boom") {
                return Err(AppError::GeocodeError("upstream 500".to_string()));
            }
            Ok(Some(Coordinates {
                latitude: 37.5,
                longitude: 127.0,
            }))
        }
    }

    #[derive(Default)]
    struct TrackingGeocoder {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for TrackingGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinates>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(None)
        }
    }

    /// Rejects every record whose address contains "reject"
    struct PickyStore;

    #[async_trait]
    impl CustomerStore for PickyStore {
        async fn load_existing_addresses(&self) -> Result<HashSet<String>> {
            Ok(HashSet::new())
        }

        async fn persist(&self, records: Vec<EnrichedRecord>) -> Result<PersistOutcome> {
            let inserted_records: Vec<StoredCustomer> = records
                .into_iter()
                .filter(|r| !r.record.address.contains("reject"))
                .enumerate()
                .map(|(i, customer)| StoredCustomer {
                    id: i as i64 + 1,
                    customer,
                })
                .collect();
            Ok(PersistOutcome {
                inserted_count: inserted_records.len(),
                inserted_records,
            })
        }

        async fn delete_by_ids(&self, _ids: &[i64]) -> Result<u64> {
            Ok(0)
        }

        async fn count(&self) -> Result<i64> {
            Ok(0)
        }
    }

    fn valid(row_index: usize, address: &str) -> ClassifiedRow {
        ClassifiedRow {
            row_index,
            record: CanonicalRecord::new("김철수", address),
            status: RowStatus::Valid,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[tokio::test]
    async fn test_commit_persists_in_row_order() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let stage = CommitStage::new(Arc::new(FixedGeocoder), store.clone(), 4);

        let rows = vec![valid(5, "Seoul E"), valid(2, "Seoul B"), valid(3, "Seoul C")];
        let result = stage.commit_on(&rows, today()).await.unwrap();

        assert_eq!(
            result,
            UploadResult {
                total: 3,
                success: 3,
                failed: 0,
                geocode_failed: 0
            }
        );

        let order: Vec<usize> = store.snapshot().iter().map(|c| c.customer.row_index).collect();
        assert_eq!(order, vec![2, 3, 5]);
        assert!(store.snapshot().iter().all(|c| c.customer.is_geocoded()));
    }

    #[tokio::test]
    async fn test_geocode_failures_degrade_only_their_row() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let stage = CommitStage::new(Arc::new(FixedGeocoder), store.clone(), 2);

        let rows = vec![valid(1, "Seoul A"), valid(2, "boom street"), valid(3, "unknown road")];
        let result = stage.commit_on(&rows, today()).await.unwrap();

        assert_eq!(result.success, 3);
        assert_eq!(result.geocode_failed, 2);

        let stored = store.snapshot();
        assert!(stored[0].customer.is_geocoded());
        assert_eq!(stored[1].customer.latitude, None);
        assert_eq!(stored[2].customer.longitude, None);
    }

    #[tokio::test]
    async fn test_partial_persist_is_counted() {
        let stage = CommitStage::new(Arc::new(FixedGeocoder), Arc::new(PickyStore), 2);

        let rows = vec![valid(1, "Seoul A"), valid(2, "reject me"), valid(3, "Seoul C")];
        let result = stage.commit_on(&rows, today()).await.unwrap();

        assert_eq!(result.total, 3);
        assert_eq!(result.success, 2);
        assert_eq!(result.failed, 1);
    }

    #[tokio::test]
    async fn test_fan_out_respects_concurrency_limit() {
        let geocoder = Arc::new(TrackingGeocoder::default());
        let stage = CommitStage::new(geocoder.clone(), Arc::new(InMemoryCustomerStore::new()), 2);

        let addresses: Vec<String> = (0..8).map(|i| format!("Seoul {}", i)).collect();
        let coords = stage.geocode_all(addresses).await;

        assert_eq!(coords.len(), 8);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 8);
        assert!(geocoder.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_missing_receipt_date_defaults_to_today() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let stage = CommitStage::new(Arc::new(FixedGeocoder), store.clone(), 1);

        let mut dated = valid(2, "Seoul B");
        dated.record.receipt_date = NaiveDate::from_ymd_opt(2024, 1, 15);
        stage
            .commit_on(&[valid(1, "Seoul A"), dated], today())
            .await
            .unwrap();

        let stored = store.snapshot();
        assert_eq!(stored[0].customer.record.receipt_date, Some(today()));
        assert_eq!(stored[1].customer.record.receipt_date, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[tokio::test]
    async fn test_receipt_date_default_can_be_disabled() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let stage = CommitStage::new(Arc::new(FixedGeocoder), store.clone(), 1)
            .with_receipt_date_default(false);

        stage.commit_on(&[valid(1, "Seoul A")], today()).await.unwrap();
        assert_eq!(store.snapshot()[0].customer.record.receipt_date, None);
    }

    #[tokio::test]
    async fn test_non_valid_rows_are_skipped() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let stage = CommitStage::new(Arc::new(FixedGeocoder), store.clone(), 1);

        let duplicate = ClassifiedRow {
            row_index: 2,
            record: CanonicalRecord::new("이영희", "Seoul A"),
            status: RowStatus::Duplicate {
                reason: DuplicateReason::DuplicateInUpload,
            },
        };
        let result = stage
            .commit_on(&[valid(1, "Seoul A"), duplicate], today())
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
