use async_trait::async_trait;
use std::sync::Arc;

use super::{PreparedDataset, ScoreSnapshot};
use crate::domain::{Dataset, DatasetId};
use crate::error::Result;

/// Storage trait for accepted datasets, their prepared metrics, and committed scores
#[async_trait]
pub trait Storage: Send + Sync {
    // Dataset operations
    /// Store an accepted dataset. Re-validating an existing id replaces it,
    /// drops its prepared metrics and current scores, and advances its score
    /// version so in-flight runs cannot commit.
    async fn put_dataset(&self, dataset: Dataset) -> Result<()>;
    async fn get_dataset(&self, dataset_id: &DatasetId) -> Result<Option<Arc<Dataset>>>;

    // Prepared (normalized, derived, rescaled) metrics
    /// Cache prepared metrics unless the dataset they were built from has
    /// since been replaced
    async fn put_prepared(&self, prepared: Arc<PreparedDataset>) -> Result<()>;
    async fn get_prepared(&self, dataset_id: &DatasetId) -> Result<Option<Arc<PreparedDataset>>>;

    // Score operations
    async fn current_scores(&self, dataset_id: &DatasetId) -> Result<Option<Arc<ScoreSnapshot>>>;
    /// Version of the last committed snapshot (0 if none)
    async fn score_version(&self, dataset_id: &DatasetId) -> Result<u64>;
    /// Swap in a complete snapshot only if no other commit happened since
    /// `expected_version` was read. Returns the committed snapshot.
    async fn commit_scores(
        &self,
        expected_version: u64,
        snapshot: ScoreSnapshot,
    ) -> Result<Arc<ScoreSnapshot>>;
}
