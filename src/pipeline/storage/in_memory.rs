use super::traits::Storage;
use super::{PreparedDataset, ScoreSnapshot};
use crate::domain::{Dataset, DatasetId};
use crate::error::{ReadinessError, Result};
use crate::pipeline::provenance::content_ref;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Version counter plus the currently authoritative snapshot
#[derive(Default)]
struct ScoreSlot {
    version: u64,
    current: Option<Arc<ScoreSnapshot>>,
}

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    datasets: RwLock<HashMap<DatasetId, Arc<Dataset>>>,
    prepared: RwLock<HashMap<DatasetId, Arc<PreparedDataset>>>,
    scores: RwLock<HashMap<DatasetId, ScoreSlot>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            datasets: RwLock::new(HashMap::new()),
            prepared: RwLock::new(HashMap::new()),
            scores: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn put_dataset(&self, dataset: Dataset) -> Result<()> {
        let id = dataset.id.clone();
        let rows = dataset.rows.len();

        // Lock order: datasets, prepared, scores
        let mut datasets = self.datasets.write().await;
        let mut prepared = self.prepared.write().await;
        let mut scores = self.scores.write().await;

        let replaced = datasets.insert(id.clone(), Arc::new(dataset)).is_some();
        prepared.remove(&id);
        if replaced {
            // Fails the commit of any run that started on the old rows
            let slot = scores.entry(id.clone()).or_default();
            slot.version += 1;
            slot.current = None;
        }

        debug!("Stored dataset {} with {} rows (replaced: {})", id, rows, replaced);
        Ok(())
    }

    async fn get_dataset(&self, dataset_id: &DatasetId) -> Result<Option<Arc<Dataset>>> {
        Ok(self.datasets.read().await.get(dataset_id).cloned())
    }

    async fn put_prepared(&self, prepared: Arc<PreparedDataset>) -> Result<()> {
        let id = prepared.dataset_id.clone();
        let datasets = self.datasets.read().await;
        let current_ref = match datasets.get(&id) {
            Some(dataset) => Some(content_ref(dataset.as_ref())?),
            None => None,
        };
        if current_ref.as_deref() != Some(prepared.source_ref.as_str()) {
            debug!("Discarding prepared metrics for dataset {} built from a replaced version", id);
            return Ok(());
        }

        self.prepared.write().await.insert(id.clone(), prepared);
        debug!("Stored prepared metrics for dataset {}", id);
        Ok(())
    }

    async fn get_prepared(&self, dataset_id: &DatasetId) -> Result<Option<Arc<PreparedDataset>>> {
        Ok(self.prepared.read().await.get(dataset_id).cloned())
    }

    async fn current_scores(&self, dataset_id: &DatasetId) -> Result<Option<Arc<ScoreSnapshot>>> {
        Ok(self
            .scores
            .read()
            .await
            .get(dataset_id)
            .and_then(|slot| slot.current.clone()))
    }

    async fn score_version(&self, dataset_id: &DatasetId) -> Result<u64> {
        Ok(self
            .scores
            .read()
            .await
            .get(dataset_id)
            .map_or(0, |slot| slot.version))
    }

    async fn commit_scores(
        &self,
        expected_version: u64,
        mut snapshot: ScoreSnapshot,
    ) -> Result<Arc<ScoreSnapshot>> {
        // Compare and swap under one write guard
        let mut scores = self.scores.write().await;
        let slot = scores.entry(snapshot.dataset_id.clone()).or_default();
        if slot.version != expected_version {
            return Err(ReadinessError::ConcurrentUpdate {
                dataset_id: snapshot.dataset_id.to_string(),
                expected: expected_version,
                found: slot.version,
            });
        }

        snapshot.version = expected_version + 1;
        snapshot.committed_at = Utc::now();
        let committed = Arc::new(snapshot);
        slot.version = committed.version;
        slot.current = Some(committed.clone());

        debug!(
            "Committed scores for dataset {} (config {}, version {})",
            committed.dataset_id, committed.config_id, committed.version
        );
        Ok(committed)
    }
}
