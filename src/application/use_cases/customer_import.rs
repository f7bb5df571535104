//! Customer import orchestration.
//!
//! `preview` runs decode, normalize and validate and writes nothing.
//! `commit` takes the valid bucket of a preview through geocoding and
//! persistence. Each call owns its own dedup state, so concurrent uploads
//! never see each other's rows until they are persisted.

use std::sync::Arc;

use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::commit_stage::CommitStage;
use super::field_normalizer::FieldNormalizer;
use super::record_validator::RecordValidator;
use crate::domain::classification::{ImportPreview, UploadResult};
use crate::domain::error::{AppError, Result};
use crate::domain::ingest_config::ImportPolicy;
use crate::domain::sheet::{RawRow, SheetFormat};
use crate::infrastructure::db::CustomerStore;
use crate::infrastructure::geocoding::Geocoder;
use crate::infrastructure::sheet;

pub struct CustomerImport {
    normalizer: FieldNormalizer,
    validator: RecordValidator,
    commit_stage: CommitStage,
    store: Arc<dyn CustomerStore>,
}

impl CustomerImport {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        geocoder: Arc<dyn Geocoder>,
        policy: &ImportPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            normalizer: FieldNormalizer::new(policy.row_filter),
            validator: RecordValidator::new(policy.precedence),
            commit_stage: CommitStage::new(geocoder, Arc::clone(&store), concurrency)
                .with_receipt_date_default(policy.default_receipt_date_to_today),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn CustomerStore> {
        &self.store
    }

    /// Decode an upload and classify every row
    pub async fn preview(&self, bytes: &[u8], format: SheetFormat) -> Result<ImportPreview> {
        let upload_id = Uuid::new_v4();
        let span = info_span!("customer_import", %upload_id, %format);

        let preview: Result<ImportPreview> = async {
            let rows = sheet::decode(bytes, format).map_err(|err| {
                error!(error = %err, "Upload could not be decoded");
                err
            })?;
            self.classify(upload_id, rows).await
        }
        .instrument(span)
        .await;

        preview
    }

    /// Classify rows that were decoded elsewhere
    pub async fn preview_rows(&self, rows: Vec<RawRow>) -> Result<ImportPreview> {
        let upload_id = Uuid::new_v4();
        self.classify(upload_id, rows)
            .instrument(info_span!("customer_import", %upload_id))
            .await
    }

    async fn classify(&self, upload_id: Uuid, rows: Vec<RawRow>) -> Result<ImportPreview> {
        let batch = self.normalizer.normalize(rows);

        let existing = self.store.load_existing_addresses().await.map_err(|err| {
            error!(error = %err, "Failed to load persisted addresses");
            err
        })?;

        let report = self.validator.validate_rows(batch.rows, &existing);
        info!(
            dropped = batch.dropped,
            total = report.summary.total,
            valid = report.summary.valid,
            "Preview ready"
        );

        Ok(ImportPreview {
            upload_id,
            dropped_rows: batch.dropped,
            report,
        })
    }

    /// Geocode and store the valid rows of a preview
    pub async fn commit(&self, preview: &ImportPreview) -> Result<UploadResult> {
        if preview.report.valid_rows.is_empty() {
            return Err(AppError::ValidationError("no valid rows to upload".to_string()));
        }

        self.commit_stage
            .commit(&preview.report.valid_rows)
            .instrument(info_span!("customer_commit", upload_id = %preview.upload_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::DuplicateReason;
    use crate::domain::ingest_config::RowFilter;
    use crate::infrastructure::db::InMemoryCustomerStore;
    use crate::infrastructure::geocoding::NoopGeocoder;

    const SCENARIO: &str = "고객명,주소,전화번호\n\
        김철수,Seoul A,010-1234-5678\n\
        ,Seoul B,010-2222-3333\n\
        이영희,Seoul A,010-9876-5432\n";

    fn import_with(store: Arc<InMemoryCustomerStore>, row_filter: RowFilter) -> CustomerImport {
        let policy = ImportPolicy {
            row_filter,
            ..ImportPolicy::default()
        };
        CustomerImport::new(store, Arc::new(NoopGeocoder), &policy, 4)
    }

    #[tokio::test]
    async fn test_preview_scenario_with_blank_row_filter() {
        let import = import_with(Arc::new(InMemoryCustomerStore::new()), RowFilter::BlankRows);
        let preview = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();

        let summary = preview.report.summary;
        assert_eq!((summary.total, summary.valid, summary.invalid, summary.duplicates), (3, 1, 1, 1));
        assert_eq!(preview.dropped_rows, 0);
        assert_eq!(preview.report.duplicates[0].row_index, 3);
    }

    #[tokio::test]
    async fn test_preview_drops_nameless_rows_by_default() {
        let import = import_with(Arc::new(InMemoryCustomerStore::new()), RowFilter::MissingCustomerName);
        let preview = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();

        assert_eq!(preview.dropped_rows, 1);
        assert_eq!(preview.report.summary.total, 2);
        assert_eq!(preview.report.summary.valid, 1);
        assert_eq!(preview.report.summary.duplicates, 1);
    }

    #[tokio::test]
    async fn test_preview_sees_persisted_addresses() {
        let store = Arc::new(InMemoryCustomerStore::with_addresses(["Seoul A"]));
        let import = import_with(store, RowFilter::BlankRows);
        let preview = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();

        assert_eq!(preview.report.summary.valid, 0);
        assert_eq!(
            preview.report.duplicates[0].reason(),
            Some(DuplicateReason::AlreadyRegistered)
        );
    }

    #[tokio::test]
    async fn test_preview_rows_keeps_row_indexes() {
        use crate::domain::sheet::CellValue;

        let headers = vec!["고객명".to_string(), "주소".to_string()];
        let rows = vec![
            RawRow::from_columns(4, &headers, vec![CellValue::from("김철수"), CellValue::from("Seoul A")]),
            RawRow::from_columns(9, &headers, vec![CellValue::from("이영희"), CellValue::from("Seoul A")]),
        ];

        let import = import_with(Arc::new(InMemoryCustomerStore::new()), RowFilter::BlankRows);
        let preview = import.preview_rows(rows).await.unwrap();

        assert_eq!(preview.report.valid_rows[0].row_index, 4);
        assert_eq!(preview.report.duplicates[0].row_index, 9);
    }

    #[tokio::test]
    async fn test_english_header_export_is_valid() {
        let upload = "Customer Name,Address\nKim,Seoul A\n".as_bytes();

        for row_filter in [RowFilter::BlankRows, RowFilter::MissingCustomerName] {
            let import = import_with(Arc::new(InMemoryCustomerStore::new()), row_filter);
            let preview = import.preview(upload, SheetFormat::Csv).await.unwrap();

            assert_eq!(preview.dropped_rows, 0);
            assert_eq!(preview.report.summary.total, 1);
            assert_eq!(preview.report.summary.valid, 1);
            assert_eq!(preview.report.valid_rows[0].record.customer_name, "Kim");
        }
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let import = import_with(Arc::new(InMemoryCustomerStore::new()), RowFilter::BlankRows);
        let result = import.preview("고객명,주소\n".as_bytes(), SheetFormat::Csv).await;
        assert!(matches!(result, Err(AppError::EmptyFile)));
    }

    #[tokio::test]
    async fn test_commit_then_reupload_is_duplicate() {
        let store = Arc::new(InMemoryCustomerStore::new());
        let import = import_with(store.clone(), RowFilter::BlankRows);

        let preview = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();
        let result = import.commit(&preview).await.unwrap();
        assert_eq!(
            result,
            UploadResult {
                total: 1,
                success: 1,
                failed: 0,
                geocode_failed: 1
            }
        );

        let again = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();
        assert_eq!(again.report.summary.valid, 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_commit_without_valid_rows_fails() {
        let store = Arc::new(InMemoryCustomerStore::with_addresses(["Seoul A", "Seoul B"]));
        let import = import_with(store, RowFilter::BlankRows);

        let preview = import.preview(SCENARIO.as_bytes(), SheetFormat::Csv).await.unwrap();
        assert!(matches!(
            import.commit(&preview).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_previews_do_not_share_state() {
        let import = import_with(Arc::new(InMemoryCustomerStore::new()), RowFilter::BlankRows);

        let (a, b) = tokio::join!(
            import.preview(SCENARIO.as_bytes(), SheetFormat::Csv),
            import.preview(SCENARIO.as_bytes(), SheetFormat::Csv)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.report, b.report);
        assert_eq!(a.report.summary.valid, 1);
        assert_ne!(a.upload_id, b.upload_id);
    }
}
