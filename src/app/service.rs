use std::sync::Arc;

use crate::app::explain_use_case::{ExplainUseCase, RegionExplanation};
use crate::app::load_use_case::LoadUseCase;
use crate::app::ports::WeightConfigSourcePort;
use crate::app::scoring_use_case::ScoringUseCase;
use crate::domain::{Dataset, DatasetId, Table};
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::normalize::{DefaultNormalizer, MissingValueStrategy, Normalizer};
use crate::pipeline::processing::score::WeightConfig;
use crate::pipeline::processing::validate::{DefaultSchemaValidator, SchemaValidator};
use crate::pipeline::provenance::{ProvenanceEntry, ProvenanceLedger, ProvenanceQuery};
use crate::pipeline::storage::{InMemoryStorage, ScoreSnapshot, Storage};

/// The four public operations over one shared store and ledger
pub struct ReadinessService {
    load: LoadUseCase,
    scoring: ScoringUseCase,
    explain: ExplainUseCase,
    ledger: Arc<ProvenanceLedger>,
    weight_source: Option<Arc<dyn WeightConfigSourcePort>>,
}

impl ReadinessService {
    pub fn new(
        validator: Box<dyn SchemaValidator + Send + Sync>,
        normalizer: Box<dyn Normalizer + Send + Sync>,
        storage: Arc<dyn Storage>,
        ledger: Arc<ProvenanceLedger>,
    ) -> Self {
        Self {
            load: LoadUseCase::new(validator, storage.clone(), ledger.clone()),
            scoring: ScoringUseCase::new(normalizer, storage.clone(), ledger.clone()),
            explain: ExplainUseCase::new(storage),
            ledger,
            weight_source: None,
        }
    }

    /// In-memory store with default stages and the given missing-value policy
    pub fn in_memory(ledger: Arc<ProvenanceLedger>, missing_values: MissingValueStrategy) -> Self {
        Self::new(
            Box::new(DefaultSchemaValidator::new()),
            Box::new(DefaultNormalizer::with_strategy(missing_values)),
            Arc::new(InMemoryStorage::new()),
            ledger,
        )
    }

    pub fn with_weight_source(mut self, source: Arc<dyn WeightConfigSourcePort>) -> Self {
        self.weight_source = Some(source);
        self
    }

    pub async fn validate_and_load(&self, table: &Table) -> Result<Dataset> {
        self.load.validate_and_load(table).await
    }

    pub async fn score_dataset(
        &self,
        dataset_id: &DatasetId,
        weights: &WeightConfig,
    ) -> Result<Arc<ScoreSnapshot>> {
        self.scoring.score_dataset(dataset_id, weights).await
    }

    /// Score with a weight config looked up by id
    pub async fn score_with_config(
        &self,
        dataset_id: &DatasetId,
        config_id: &str,
    ) -> Result<Arc<ScoreSnapshot>> {
        let source = self
            .weight_source
            .as_ref()
            .ok_or_else(|| ReadinessError::Config("no weight config source configured".to_string()))?;
        let weights = source.load(config_id).await?;
        self.scoring.score_dataset(dataset_id, &weights).await
    }

    pub async fn explain(&self, dataset_id: &DatasetId, region_id: &str) -> Result<RegionExplanation> {
        self.explain.explain(dataset_id, region_id).await
    }

    /// Ledger entries for a dataset in chronological order
    pub async fn get_provenance(
        &self,
        dataset_id: &DatasetId,
        filter: &ProvenanceQuery,
    ) -> Vec<ProvenanceEntry> {
        self.ledger.query(dataset_id, filter).await
    }
}
