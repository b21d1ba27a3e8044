// Pipeline processing: validation, cleaning, derivation, rescaling, scoring, ranking

pub mod validate;
pub mod normalize;
pub mod derive;
pub mod rescale;
pub mod score;
pub mod explain;

// Re-export the stage entry points
pub use derive::derive_all;
pub use explain::{rank_all, rank_factors, ContributingFactor, FactorRanking};
pub use normalize::{DefaultNormalizer, NormalizationReport, Normalizer};
pub use rescale::{rescale_dataset, RescaledDataset};
pub use score::{score_dataset, ScoreResult, WeightConfig};
pub use validate::{DefaultSchemaValidator, SchemaValidator};
