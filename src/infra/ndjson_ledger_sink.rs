use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app::ports::ProvenanceSinkPort;
use crate::error::{ReadinessError, Result};
use crate::pipeline::provenance::ProvenanceEntry;

/// Mirrors ledger entries to an append-only NDJSON file, one entry per line
pub struct NdjsonLedgerSink {
    path: PathBuf,
    // Keeps concurrent appends from interleaving
    write_lock: Mutex<()>,
}

impl NdjsonLedgerSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry back. A missing file is an empty ledger; a blank line
    /// is skipped; a malformed line is an error.
    pub async fn load(path: &Path) -> Result<Vec<ProvenanceEntry>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No ledger file at {}", path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ProvenanceEntry = serde_json::from_str(line).map_err(|e| {
                warn!("Malformed ledger line {} in {}: {}", line_no + 1, path.display(), e);
                ReadinessError::Ledger(format!(
                    "{}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }
        debug!("Loaded {} ledger entries from {}", entries.len(), path.display());
        Ok(entries)
    }
}

#[async_trait]
impl ProvenanceSinkPort for NdjsonLedgerSink {
    async fn append(&self, entry: &ProvenanceEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetId;
    use crate::pipeline::provenance::{ProvenanceDraft, ProvenanceLedger, ProvenanceQuery, Stage};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.ndjson");
        let sink = Arc::new(NdjsonLedgerSink::new(&path));
        let ledger = ProvenanceLedger::with_sink(sink.clone());

        let id = DatasetId::from("d1");
        ledger
            .record(ProvenanceDraft::new(&id, Stage::Validate).output("sha256:00"))
            .await
            .unwrap();
        ledger
            .record(ProvenanceDraft::new(&id, Stage::Score).failed("boom"))
            .await
            .unwrap();

        let loaded = NdjsonLedgerSink::load(&path).await.unwrap();
        assert_eq!(loaded, ledger.query(&id, &ProvenanceQuery::default()).await);
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let loaded = NdjsonLedgerSink::load(&dir.path().join("absent.ndjson"))
            .await
            .unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_line_is_a_ledger_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.ndjson");
        std::fs::write(&path, "{\"seq\": \n").unwrap();
        let err = NdjsonLedgerSink::load(&path).await.unwrap_err();
        assert!(matches!(err, ReadinessError::Ledger(_)));
    }
}
