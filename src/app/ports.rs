use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::processing::score::WeightConfig;
use crate::pipeline::provenance::ProvenanceEntry;

/// Durable destination for ledger entries. A failed append fails the
/// operation that triggered it.
#[async_trait]
pub trait ProvenanceSinkPort: Send + Sync {
    async fn append(&self, entry: &ProvenanceEntry) -> Result<()>;
}

/// Source of persisted weight configurations
#[async_trait]
pub trait WeightConfigSourcePort: Send + Sync {
    async fn load(&self, config_id: &str) -> Result<WeightConfig>;
}
