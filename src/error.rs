use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadinessError {
    #[error("Schema error in dataset {dataset_id}: {message}")]
    Schema { dataset_id: String, message: String },

    #[error("Size error in dataset {dataset_id}: {rows} rows (expected 1..={max})")]
    Size {
        dataset_id: String,
        rows: usize,
        max: usize,
    },

    #[error("Duplicate region '{region}' in dataset {dataset_id}")]
    DuplicateKey { dataset_id: String, region: String },

    #[error("Insufficient data in dataset {dataset_id}: {message}")]
    InsufficientData { dataset_id: String, message: String },

    #[error("Invalid weight config '{config_id}': {message}")]
    InvalidWeightConfig { config_id: String, message: String },

    #[error("Score computation failed for region '{region}': {message}")]
    ScoreComputation { region: String, message: String },

    #[error("Concurrent update on dataset {dataset_id}: expected version {expected}, found {found}")]
    ConcurrentUpdate {
        dataset_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provenance ledger write failed: {0}")]
    Ledger(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadinessError {
    /// Stable short code used in ledger error lists and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            ReadinessError::Schema { .. } => "schema_error",
            ReadinessError::Size { .. } => "size_error",
            ReadinessError::DuplicateKey { .. } => "duplicate_key_error",
            ReadinessError::InsufficientData { .. } => "insufficient_data_error",
            ReadinessError::InvalidWeightConfig { .. } => "invalid_weight_config",
            ReadinessError::ScoreComputation { .. } => "score_computation_error",
            ReadinessError::ConcurrentUpdate { .. } => "concurrent_update",
            ReadinessError::NotFound(_) => "not_found",
            ReadinessError::Ledger(_) => "ledger_error",
            ReadinessError::Config(_) => "config_error",
            ReadinessError::Json(_) => "json_error",
            ReadinessError::Toml(_) => "toml_error",
            ReadinessError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadinessError>;
