use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{Dataset, DatasetId};
use crate::error::{ReadinessError, Result};
use crate::metrics::{IntakeMetrics, ScoringMetrics};
use crate::pipeline::processing::derive::derive_all;
use crate::pipeline::processing::explain::rank_all;
use crate::pipeline::processing::normalize::{DefaultNormalizer, Normalizer};
use crate::pipeline::processing::rescale::rescale_dataset;
use crate::pipeline::processing::score::{score_dataset, WeightConfig};
use crate::pipeline::provenance::{content_ref, ProvenanceDraft, ProvenanceLedger, Stage, StageStatus};
use crate::pipeline::storage::{PreparedDataset, ScoreSnapshot, Storage};

/// Use case for scoring a dataset under a weight configuration and ranking
/// the drivers of every region's score
pub struct ScoringUseCase {
    normalizer: Box<dyn Normalizer + Send + Sync>,
    storage: Arc<dyn Storage>,
    ledger: Arc<ProvenanceLedger>,
}

impl ScoringUseCase {
    pub fn new(
        normalizer: Box<dyn Normalizer + Send + Sync>,
        storage: Arc<dyn Storage>,
        ledger: Arc<ProvenanceLedger>,
    ) -> Self {
        Self {
            normalizer,
            storage,
            ledger,
        }
    }

    /// Create a use case with the default normalizer
    pub fn with_default_normalizer(storage: Arc<dyn Storage>, ledger: Arc<ProvenanceLedger>) -> Self {
        Self::new(Box::new(DefaultNormalizer::new()), storage, ledger)
    }

    /// Return the cached weight-independent metrics for a dataset, building
    /// them on first use
    pub async fn prepare(&self, dataset_id: &DatasetId) -> Result<Arc<PreparedDataset>> {
        if let Some(prepared) = self.storage.get_prepared(dataset_id).await? {
            debug!(dataset_id = %dataset_id, "Using cached prepared metrics");
            return Ok(prepared);
        }

        let dataset = self.load_dataset(dataset_id).await?;
        let prepared = Arc::new(self.build_prepared(&dataset).await?);
        self.storage.put_prepared(prepared.clone()).await?;
        Ok(prepared)
    }

    async fn load_dataset(&self, dataset_id: &DatasetId) -> Result<Arc<Dataset>> {
        self.storage
            .get_dataset(dataset_id)
            .await?
            .ok_or_else(|| ReadinessError::NotFound(format!("dataset {}", dataset_id)))
    }

    /// Normalize, derive and rescale, recording one ledger entry per stage
    async fn build_prepared(&self, dataset: &Dataset) -> Result<PreparedDataset> {
        let dataset_ref = content_ref(dataset)?;

        // Normalize
        let started = Instant::now();
        let report = self.normalizer.normalize(dataset);
        IntakeMetrics::record_normalization(
            report.records.len(),
            report.excluded_rows.len(),
            report.warning_count(),
            report.error_count(),
            report.quality_score,
        );
        let parameters = json!({
            "step": "clean",
            "quality_score": report.quality_score,
            "total_cells": report.total_cells,
            "warnings": report.warning_count(),
            "errors": report.error_count(),
            "excluded_rows": report.excluded_rows,
        });
        let issue_messages: Vec<String> = report
            .issues
            .iter()
            .map(|i| format!("row {} {}: {}", i.row, i.column, i.message))
            .collect();

        if report.records.is_empty() {
            let err = ReadinessError::InsufficientData {
                dataset_id: dataset.id.to_string(),
                message: format!("all {} rows excluded by normalization", dataset.rows.len()),
            };
            warn!(dataset_id = %dataset.id, "{}", err);
            self.ledger
                .record(
                    ProvenanceDraft::new(&dataset.id, Stage::Normalize)
                        .input(dataset_ref)
                        .parameters(parameters)
                        .duration(started.elapsed())
                        .errors(issue_messages)
                        .failed(format!("{}: {}", err.code(), err)),
                )
                .await?;
            ScoringMetrics::record_run_failed(err.code());
            return Err(err);
        }

        let status = if report.is_partial() {
            warn!(
                dataset_id = %dataset.id,
                excluded = report.excluded_rows.len(),
                "Rows excluded by normalization"
            );
            StageStatus::Partial
        } else {
            StageStatus::Success
        };
        let normalized_ref = content_ref(&report.records)?;
        self.ledger
            .record(
                ProvenanceDraft::new(&dataset.id, Stage::Normalize)
                    .input(dataset_ref.clone())
                    .output(normalized_ref.clone())
                    .parameters(parameters)
                    .status(status)
                    .duration(started.elapsed())
                    .errors(issue_messages),
            )
            .await?;

        // Derive
        let started = Instant::now();
        let derived = derive_all(&report.records);
        let undefined: usize = derived
            .iter()
            .map(|row| row.metrics.len() - row.defined_count())
            .sum();
        let derived_ref = content_ref(&derived)?;
        self.ledger
            .record(
                ProvenanceDraft::new(&dataset.id, Stage::Derive)
                    .input(normalized_ref)
                    .output(derived_ref.clone())
                    .parameters(json!({ "rows": derived.len(), "undefined_values": undefined }))
                    .duration(started.elapsed()),
            )
            .await?;

        // Rescale (recorded as the second normalize step)
        let started = Instant::now();
        let rescaled = rescale_dataset(&derived);
        self.ledger
            .record(
                ProvenanceDraft::new(&dataset.id, Stage::Normalize)
                    .input(derived_ref)
                    .output(content_ref(&rescaled)?)
                    .parameters(json!({ "step": "rescale", "ranges": rescaled.ranges }))
                    .duration(started.elapsed()),
            )
            .await?;

        ScoringMetrics::record_prepared(derived.len(), undefined);
        info!(
            dataset_id = %dataset.id,
            rows = derived.len(),
            undefined_values = undefined,
            quality_score = report.quality_score,
            "Prepared dataset for scoring"
        );

        Ok(PreparedDataset {
            dataset_id: dataset.id.clone(),
            source_ref: dataset_ref,
            normalization: report,
            derived,
            rescaled,
        })
    }

    /// Score every region and replace the dataset's results as one unit.
    ///
    /// Any failure leaves the previously committed snapshot authoritative.
    pub async fn score_dataset(
        &self,
        dataset_id: &DatasetId,
        weights: &WeightConfig,
    ) -> Result<Arc<ScoreSnapshot>> {
        let started = Instant::now();
        self.load_dataset(dataset_id).await?;
        let parameters = json!({ "config_id": weights.id, "weights": weights.weights });

        if let Err(e) = weights.validate() {
            warn!(dataset_id = %dataset_id, "Weight config rejected: {}", e);
            self.record_failed_score(dataset_id, parameters, &e, None, started).await?;
            ScoringMetrics::record_run_failed(e.code());
            return Err(e);
        }

        let expected_version = self.storage.score_version(dataset_id).await?;
        let prepared = self.prepare(dataset_id).await?;
        let rescaled_ref = content_ref(&prepared.rescaled)?;

        let results = match score_dataset(&prepared.rescaled, weights) {
            Ok(results) => results,
            Err(e) => {
                warn!(dataset_id = %dataset_id, "Scoring run aborted: {}", e);
                self.record_failed_score(dataset_id, parameters, &e, None, started).await?;
                ScoringMetrics::record_run_failed(e.code());
                return Err(e);
            }
        };
        let insufficient = results.iter().filter(|r| r.insufficient_metrics).count();

        let rank_started = Instant::now();
        let rankings = rank_all(&results);
        let partial = rankings.iter().filter(|r| r.partial).count();

        let previous_seq = self
            .storage
            .current_scores(dataset_id)
            .await?
            .and_then(|s| s.ledger_seq);
        let results_ref = content_ref(&results)?;
        // Results travel with the entry so they outlive the snapshot swap
        let score_entry = self
            .ledger
            .record(
                ProvenanceDraft::new(dataset_id, Stage::Score)
                    .input(rescaled_ref)
                    .output(results_ref.clone())
                    .parameters(json!({
                        "config_id": weights.id,
                        "weights": weights.weights,
                        "results": results,
                    }))
                    .status(if insufficient > 0 {
                        StageStatus::Partial
                    } else {
                        StageStatus::Success
                    })
                    .duration(started.elapsed())
                    .supersedes(previous_seq),
            )
            .await?;
        let explain_entry = self
            .ledger
            .record(
                ProvenanceDraft::new(dataset_id, Stage::Explain)
                    .input(results_ref)
                    .output(content_ref(&rankings)?)
                    .parameters(json!({
                        "config_id": weights.id,
                        "partial_rankings": partial,
                        "rankings": rankings,
                    }))
                    .status(if partial > 0 {
                        StageStatus::Partial
                    } else {
                        StageStatus::Success
                    })
                    .duration(rank_started.elapsed()),
            )
            .await;
        if let Err(e) = explain_entry {
            warn!(dataset_id = %dataset_id, "Explain entry not recorded: {}", e);
            self.close_score_entry(dataset_id, parameters, &e, score_entry.seq, started)
                .await;
            ScoringMetrics::record_run_failed(e.code());
            return Err(e);
        }

        let snapshot = ScoreSnapshot {
            dataset_id: dataset_id.clone(),
            config_id: weights.id.clone(),
            version: expected_version,
            committed_at: chrono::Utc::now(),
            results,
            rankings,
            ledger_seq: Some(score_entry.seq),
        };
        let committed = match self.storage.commit_scores(expected_version, snapshot).await {
            Ok(committed) => committed,
            Err(e) => {
                warn!(dataset_id = %dataset_id, "Score commit rejected: {}", e);
                self.close_score_entry(dataset_id, parameters, &e, score_entry.seq, started)
                    .await;
                ScoringMetrics::record_run_failed(e.code());
                return Err(e);
            }
        };

        ScoringMetrics::record_run_committed(
            committed.results.len(),
            insufficient,
            partial,
            started.elapsed().as_secs_f64(),
        );
        info!(
            dataset_id = %dataset_id,
            config_id = %weights.id,
            version = committed.version,
            regions = committed.results.len(),
            insufficient,
            "Committed scores"
        );
        Ok(committed)
    }

    /// Mark an already recorded score entry as not committed. The original
    /// error is what the caller reports, so a ledger failure here is only logged.
    async fn close_score_entry(
        &self,
        dataset_id: &DatasetId,
        parameters: serde_json::Value,
        error: &ReadinessError,
        score_seq: u64,
        started: Instant,
    ) {
        if let Err(e) = self
            .record_failed_score(dataset_id, parameters, error, Some(score_seq), started)
            .await
        {
            warn!(dataset_id = %dataset_id, score_seq, "Could not supersede score entry: {}", e);
        }
    }

    async fn record_failed_score(
        &self,
        dataset_id: &DatasetId,
        parameters: serde_json::Value,
        error: &ReadinessError,
        supersedes: Option<u64>,
        started: Instant,
    ) -> Result<()> {
        self.ledger
            .record(
                ProvenanceDraft::new(dataset_id, Stage::Score)
                    .parameters(parameters)
                    .duration(started.elapsed())
                    .supersedes(supersedes)
                    .failed(format!("{}: {}", error.code(), error)),
            )
            .await?;
        Ok(())
    }
}
