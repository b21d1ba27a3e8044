use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::{ProvenanceDraft, ProvenanceEntry, ProvenanceQuery, Stage, StageStatus};
use crate::app::ports::ProvenanceSinkPort;
use crate::domain::DatasetId;
use crate::error::{ReadinessError, Result};
use crate::metrics::LedgerMetrics;

/// Append-only, sequence-numbered log of provenance entries.
///
/// Writers only contend on the atomic sequence counter and the push; entries
/// are never mutated or removed.
pub struct ProvenanceLedger {
    next_seq: AtomicU64,
    entries: RwLock<Vec<ProvenanceEntry>>,
    sink: Option<Arc<dyn ProvenanceSinkPort>>,
}

impl Default for ProvenanceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvenanceLedger {
    /// In-memory ledger without a durable sink
    pub fn new() -> Self {
        Self {
            next_seq: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
            sink: None,
        }
    }

    /// Ledger mirroring every entry to `sink` before acknowledging it
    pub fn with_sink(sink: Arc<dyn ProvenanceSinkPort>) -> Self {
        Self {
            sink: Some(sink),
            ..Self::new()
        }
    }

    /// Rebuild a ledger from previously persisted entries
    pub fn restore(
        mut entries: Vec<ProvenanceEntry>,
        sink: Option<Arc<dyn ProvenanceSinkPort>>,
    ) -> Self {
        entries.sort_by_key(|e| e.seq);
        let next = entries.last().map_or(1, |e| e.seq + 1);
        Self {
            next_seq: AtomicU64::new(next),
            entries: RwLock::new(entries),
            sink,
        }
    }

    /// Stamp and append an entry. If the sink rejects it the entry is not
    /// recorded and the caller's operation must be treated as failed.
    pub async fn record(&self, draft: ProvenanceDraft) -> Result<ProvenanceEntry> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let entry = ProvenanceEntry {
            seq,
            dataset_id: draft.dataset_id,
            recorded_at: Utc::now(),
            stage: draft.stage,
            input_refs: draft.input_refs,
            output_ref: draft.output_ref,
            parameters: draft.parameters,
            status: draft.status,
            duration_ms: u64::try_from(draft.duration.as_millis()).unwrap_or(u64::MAX),
            errors: draft.errors,
            supersedes: draft.supersedes,
        };

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.append(&entry).await {
                error!(seq, stage = %entry.stage, "Provenance sink rejected entry: {}", e);
                LedgerMetrics::record_append_error(entry.stage.as_str());
                return Err(ReadinessError::Ledger(e.to_string()));
            }
        }

        self.entries.write().await.push(entry.clone());
        LedgerMetrics::record_append(entry.stage.as_str());
        debug!(
            seq,
            dataset_id = %entry.dataset_id,
            stage = %entry.stage,
            status = ?entry.status,
            "Recorded provenance entry"
        );
        Ok(entry)
    }

    /// Entries for a dataset in ledger (sequence) order
    pub async fn query(&self, dataset_id: &DatasetId, filter: &ProvenanceQuery) -> Vec<ProvenanceEntry> {
        let entries = self.entries.read().await;
        let mut matched: Vec<ProvenanceEntry> = entries
            .iter()
            .filter(|e| &e.dataset_id == dataset_id && filter.matches(e))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.seq);
        matched
    }

    /// Most recent entry for a dataset/stage with the given status
    pub async fn latest(
        &self,
        dataset_id: &DatasetId,
        stage: Stage,
        status: StageStatus,
    ) -> Option<ProvenanceEntry> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .filter(|e| &e.dataset_id == dataset_id && e.stage == stage && e.status == status)
            .max_by_key(|e| e.seq)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RejectingSink;

    #[async_trait]
    impl ProvenanceSinkPort for RejectingSink {
        async fn append(&self, _entry: &ProvenanceEntry) -> Result<()> {
            Err(ReadinessError::Ledger("disk full".to_string()))
        }
    }

    #[derive(Default)]
    struct CollectingSink {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ProvenanceSinkPort for CollectingSink {
        async fn append(&self, entry: &ProvenanceEntry) -> Result<()> {
            self.seen.lock().unwrap().push(entry.seq);
            Ok(())
        }
    }

    fn draft(dataset: &str, stage: Stage) -> ProvenanceDraft {
        ProvenanceDraft::new(&DatasetId::from(dataset), stage)
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let ledger = ProvenanceLedger::new();
        let a = ledger.record(draft("d1", Stage::Validate)).await.unwrap();
        let b = ledger.record(draft("d1", Stage::Normalize)).await.unwrap();
        assert!(b.seq > a.seq);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_query_filters_by_dataset_and_stage() {
        let ledger = ProvenanceLedger::new();
        ledger.record(draft("d1", Stage::Validate)).await.unwrap();
        ledger.record(draft("d2", Stage::Validate)).await.unwrap();
        ledger.record(draft("d1", Stage::Score)).await.unwrap();

        let all = ledger
            .query(&DatasetId::from("d1"), &ProvenanceQuery::default())
            .await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].stage, Stage::Validate);

        let scores = ledger
            .query(&DatasetId::from("d1"), &ProvenanceQuery::stage(Stage::Score))
            .await;
        assert_eq!(scores.len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_by_time_range() {
        let ledger = ProvenanceLedger::new();
        let entry = ledger.record(draft("d1", Stage::Validate)).await.unwrap();
        let before = ProvenanceQuery {
            until: Some(entry.recorded_at - chrono::Duration::seconds(1)),
            ..ProvenanceQuery::default()
        };
        assert!(ledger.query(&DatasetId::from("d1"), &before).await.is_empty());
        let around = ProvenanceQuery {
            since: Some(entry.recorded_at),
            until: Some(entry.recorded_at),
            ..ProvenanceQuery::default()
        };
        assert_eq!(ledger.query(&DatasetId::from("d1"), &around).await.len(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_fails_the_record() {
        let ledger = ProvenanceLedger::with_sink(Arc::new(RejectingSink));
        let err = ledger.record(draft("d1", Stage::Validate)).await.unwrap_err();
        assert!(matches!(err, ReadinessError::Ledger(_)));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_sink_sees_every_entry() {
        let sink = Arc::new(CollectingSink::default());
        let ledger = ProvenanceLedger::with_sink(sink.clone());
        ledger.record(draft("d1", Stage::Validate)).await.unwrap();
        ledger.record(draft("d1", Stage::Score)).await.unwrap();
        assert_eq!(*sink.seen.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_restore_continues_numbering() {
        let ledger = ProvenanceLedger::new();
        ledger.record(draft("d1", Stage::Validate)).await.unwrap();
        ledger.record(draft("d1", Stage::Score)).await.unwrap();
        let saved = ledger
            .query(&DatasetId::from("d1"), &ProvenanceQuery::default())
            .await;

        let restored = ProvenanceLedger::restore(saved, None);
        let next = restored.record(draft("d1", Stage::Explain)).await.unwrap();
        assert_eq!(next.seq, 3);
    }

    #[tokio::test]
    async fn test_concurrent_writers_get_unique_sequence_numbers() {
        let ledger = Arc::new(ProvenanceLedger::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger.record(draft("d1", Stage::Derive)).await.unwrap().seq
            }));
        }
        let mut seqs = Vec::new();
        for handle in handles {
            seqs.push(handle.await.unwrap());
        }
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 16);

        let entries = ledger
            .query(&DatasetId::from("d1"), &ProvenanceQuery::default())
            .await;
        assert!(entries.windows(2).all(|w| w[0].seq < w[1].seq));
    }
}
