use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_ENV_VAR;
use crate::domain::Metric;
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::normalize::MissingValueStrategy;
use crate::pipeline::processing::score::WeightConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub ledger: LedgerConfig,
    pub normalization: NormalizationConfig,
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            file_prefix: "readiness.log".to_string(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// NDJSON mirror of the provenance ledger; in-memory only when unset
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub missing_value_strategy: MissingValueStrategy,
}

/// Default weight vector used when no weights file is given
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub id: String,
    pub values: BTreeMap<Metric, f64>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let uniform = WeightConfig::uniform("uniform");
        Self {
            id: uniform.id,
            values: uniform.weights,
        }
    }
}

impl WeightsConfig {
    pub fn to_weight_config(&self) -> WeightConfig {
        WeightConfig::new(self.id.clone(), self.values.clone())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReadinessError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.weights.to_weight_config().validate()?;
        Ok(config)
    }

    /// Load from `READINESS_CONFIG` if set, otherwise fall back to defaults
    pub fn load_from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => Ok(Self::default()),
        }
    }

    /// Explicit path wins over the environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load_from_env(),
        }
    }
}
