// Data processing pipeline: stages, provenance, and storage

pub mod processing;
pub mod provenance;
pub mod storage;

// Re-export key types from each stage
pub use provenance::{ProvenanceEntry, ProvenanceLedger, ProvenanceQuery, Stage, StageStatus};
pub use storage::{InMemoryStorage, ScoreSnapshot, Storage};
