//! Provenance records for every pipeline stage invocation.

pub mod ledger;

pub use ledger::ProvenanceLedger;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

use crate::domain::DatasetId;
use crate::error::Result;
use crate::pipeline::processing::score::ScoreResult;

/// Pipeline stage that produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    /// Cell repair and missing-value handling, and min–max rescaling
    /// (`"step": "rescale"` in the parameters)
    Normalize,
    Derive,
    Score,
    Explain,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Normalize => "normalize",
            Stage::Derive => "derive",
            Stage::Score => "score",
            Stage::Explain => "explain",
        }
    }

    pub fn from_name(name: &str) -> Option<Stage> {
        [
            Stage::Validate,
            Stage::Normalize,
            Stage::Derive,
            Stage::Score,
            Stage::Explain,
        ]
        .into_iter()
        .find(|s| s.as_str() == name.trim().to_lowercase())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
    /// Completed with some rows excluded or some results incomplete
    Partial,
}

/// An immutable, sequence-numbered ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub seq: u64,
    pub dataset_id: DatasetId,
    pub recorded_at: DateTime<Utc>,
    pub stage: Stage,
    pub input_refs: Vec<String>,
    pub output_ref: Option<String>,
    /// Snapshot of the parameters the stage ran with
    pub parameters: serde_json::Value,
    pub status: StageStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Sequence number of the entry this one replaces
    #[serde(default)]
    pub supersedes: Option<u64>,
}

impl ProvenanceEntry {
    /// Per-region results carried by a `score` entry. Still readable after a
    /// later run has replaced the committed snapshot.
    pub fn score_results(&self) -> Result<Option<Vec<ScoreResult>>> {
        match (self.stage, self.parameters.get("results")) {
            (Stage::Score, Some(results)) => Ok(Some(serde_json::from_value(results.clone())?)),
            _ => Ok(None),
        }
    }
}

/// An entry before the ledger stamps it with a sequence number and time
#[derive(Debug, Clone)]
pub struct ProvenanceDraft {
    pub dataset_id: DatasetId,
    pub stage: Stage,
    pub input_refs: Vec<String>,
    pub output_ref: Option<String>,
    pub parameters: serde_json::Value,
    pub status: StageStatus,
    pub duration: Duration,
    pub errors: Vec<String>,
    pub supersedes: Option<u64>,
}

impl ProvenanceDraft {
    pub fn new(dataset_id: &DatasetId, stage: Stage) -> Self {
        Self {
            dataset_id: dataset_id.clone(),
            stage,
            input_refs: Vec::new(),
            output_ref: None,
            parameters: serde_json::Value::Null,
            status: StageStatus::Success,
            duration: Duration::ZERO,
            errors: Vec::new(),
            supersedes: None,
        }
    }

    pub fn input(mut self, reference: impl Into<String>) -> Self {
        self.input_refs.push(reference.into());
        self
    }

    pub fn output(mut self, reference: impl Into<String>) -> Self {
        self.output_ref = Some(reference.into());
        self
    }

    pub fn parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn status(mut self, status: StageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.status = StageStatus::Failed;
        self.errors.push(error.into());
        self
    }

    pub fn supersedes(mut self, seq: Option<u64>) -> Self {
        self.supersedes = seq;
        self
    }
}

/// Optional filters for ledger queries; all bounds inclusive
#[derive(Debug, Clone, Default)]
pub struct ProvenanceQuery {
    pub stage: Option<Stage>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl ProvenanceQuery {
    pub fn stage(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn matches(&self, entry: &ProvenanceEntry) -> bool {
        self.stage.map_or(true, |s| s == entry.stage)
            && self.since.map_or(true, |t| entry.recorded_at >= t)
            && self.until.map_or(true, |t| entry.recorded_at <= t)
    }
}

/// Content address of a serializable stage output
pub fn content_ref<T: Serialize>(value: &T) -> Result<String> {
    let bytes = serde_json::to_vec(value)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("sha256:{}", hex::encode(digest)))
}
