use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::domain::{Dataset, DatasetId, Table};
use crate::error::Result;
use crate::metrics::IntakeMetrics;
use crate::pipeline::processing::validate::{DefaultSchemaValidator, SchemaValidator};
use crate::pipeline::provenance::{content_ref, ProvenanceDraft, ProvenanceLedger, Stage};
use crate::pipeline::storage::Storage;

/// Use case for admitting a parsed table as a dataset
pub struct LoadUseCase {
    validator: Box<dyn SchemaValidator + Send + Sync>,
    storage: Arc<dyn Storage>,
    ledger: Arc<ProvenanceLedger>,
}

impl LoadUseCase {
    pub fn new(
        validator: Box<dyn SchemaValidator + Send + Sync>,
        storage: Arc<dyn Storage>,
        ledger: Arc<ProvenanceLedger>,
    ) -> Self {
        Self {
            validator,
            storage,
            ledger,
        }
    }

    /// Create a use case with the default schema validator
    pub fn with_default_validator(storage: Arc<dyn Storage>, ledger: Arc<ProvenanceLedger>) -> Self {
        Self::new(Box::new(DefaultSchemaValidator::new()), storage, ledger)
    }

    /// Validate a table and persist it as a dataset.
    ///
    /// Rejection is all-or-nothing: on failure only a `failed` validate entry is
    /// written. On success the ledger entry is written before the dataset is
    /// stored, so a ledger failure leaves nothing persisted.
    pub async fn validate_and_load(&self, table: &Table) -> Result<Dataset> {
        let dataset_id = table
            .dataset_id
            .as_deref()
            .map(DatasetId::from)
            .unwrap_or_else(DatasetId::generate);
        let started = Instant::now();
        let table_ref = content_ref(table)?;
        let parameters = json!({
            "columns": table.columns,
            "row_count": table.rows.len(),
        });

        let dataset = match self.validator.validate(table, &dataset_id) {
            Ok(dataset) => dataset,
            Err(e) => {
                warn!(dataset_id = %dataset_id, "Table rejected: {}", e);
                IntakeMetrics::record_rejection(e.code());
                self.ledger
                    .record(
                        ProvenanceDraft::new(&dataset_id, Stage::Validate)
                            .input(table_ref)
                            .parameters(parameters)
                            .duration(started.elapsed())
                            .failed(format!("{}: {}", e.code(), e)),
                    )
                    .await?;
                return Err(e);
            }
        };

        self.ledger
            .record(
                ProvenanceDraft::new(&dataset_id, Stage::Validate)
                    .input(table_ref)
                    .output(content_ref(&dataset)?)
                    .parameters(parameters)
                    .duration(started.elapsed()),
            )
            .await?;
        self.storage.put_dataset(dataset.clone()).await?;

        IntakeMetrics::record_validation_success(dataset.rows.len(), started.elapsed().as_secs_f64());
        info!(
            dataset_id = %dataset_id,
            rows = dataset.rows.len(),
            "Dataset accepted"
        );
        Ok(dataset)
    }
}
