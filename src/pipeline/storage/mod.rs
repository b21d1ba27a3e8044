// Storage for datasets, prepared metrics and versioned score snapshots

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryStorage;
pub use traits::Storage;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DatasetId, MetricRow};
use crate::pipeline::processing::explain::FactorRanking;
use crate::pipeline::processing::normalize::NormalizationReport;
use crate::pipeline::processing::rescale::RescaledDataset;
use crate::pipeline::processing::score::ScoreResult;

/// Weight-independent intermediate results for a dataset.
/// Rebuilt only when the dataset is re-validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedDataset {
    pub dataset_id: DatasetId,
    /// Content address of the dataset these metrics were built from
    pub source_ref: String,
    pub normalization: NormalizationReport,
    pub derived: Vec<MetricRow>,
    pub rescaled: RescaledDataset,
}

/// Complete set of results for one (dataset, weight config) pair.
/// Committed and replaced as a single unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub dataset_id: DatasetId,
    pub config_id: String,
    /// Assigned by the store on commit
    pub version: u64,
    pub committed_at: DateTime<Utc>,
    pub results: Vec<ScoreResult>,
    pub rankings: Vec<FactorRanking>,
    /// Ledger sequence number of the score entry that produced this snapshot
    pub ledger_seq: Option<u64>,
}

impl ScoreSnapshot {
    pub fn result(&self, region_id: &str) -> Option<&ScoreResult> {
        self.results.iter().find(|r| r.region_id == region_id)
    }

    pub fn ranking(&self, region_id: &str) -> Option<&FactorRanking> {
        self.rankings.iter().find(|r| r.region_id == region_id)
    }
}
