use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::{DatasetId, Metric, MetricValue};
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::explain::ContributingFactor;
use crate::pipeline::storage::Storage;

/// A region's current score together with what drove it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionExplanation {
    pub dataset_id: DatasetId,
    pub region_id: String,
    pub config_id: String,
    /// Version of the score snapshot this explanation was read from
    pub version: u64,
    pub score: Option<f64>,
    pub insufficient_metrics: bool,
    pub top_contributors: Vec<ContributingFactor>,
    pub partial: bool,
    pub rescaled_metrics: BTreeMap<Metric, MetricValue>,
}

/// Read side: explanations come from the last committed snapshot only
pub struct ExplainUseCase {
    storage: Arc<dyn Storage>,
}

impl ExplainUseCase {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn explain(&self, dataset_id: &DatasetId, region_id: &str) -> Result<RegionExplanation> {
        let snapshot = self
            .storage
            .current_scores(dataset_id)
            .await?
            .ok_or_else(|| ReadinessError::NotFound(format!("scores for dataset {}", dataset_id)))?;
        let region_id = region_id.trim();

        let not_found = || {
            ReadinessError::NotFound(format!("region '{}' in dataset {}", region_id, dataset_id))
        };
        let result = snapshot.result(region_id).ok_or_else(not_found)?;
        let ranking = snapshot.ranking(region_id).ok_or_else(not_found)?;

        let rescaled_metrics = self
            .storage
            .get_prepared(dataset_id)
            .await?
            .and_then(|prepared| prepared.rescaled.row(region_id).map(|row| row.metrics.clone()))
            .ok_or_else(not_found)?;

        debug!(
            dataset_id = %dataset_id,
            region = region_id,
            version = snapshot.version,
            "Explained region"
        );
        Ok(RegionExplanation {
            dataset_id: dataset_id.clone(),
            region_id: result.region_id.clone(),
            config_id: snapshot.config_id.clone(),
            version: snapshot.version,
            score: result.score,
            insufficient_metrics: result.insufficient_metrics,
            top_contributors: ranking.factors.clone(),
            partial: ranking.partial,
            rescaled_metrics,
        })
    }
}
