use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::app::ports::WeightConfigSourcePort;
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::score::WeightConfig;

/// Weight configs stored as `<dir>/<config_id>.toml`
pub struct TomlWeightSource {
    dir: PathBuf,
}

impl TomlWeightSource {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl WeightConfigSourcePort for TomlWeightSource {
    async fn load(&self, config_id: &str) -> Result<WeightConfig> {
        if config_id.is_empty() || config_id.contains(&['/', '\\'][..]) || config_id.starts_with('.') {
            return Err(ReadinessError::InvalidWeightConfig {
                config_id: config_id.to_string(),
                message: "config id is not a valid file name".to_string(),
            });
        }

        let path = self.dir.join(format!("{}.toml", config_id));
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReadinessError::NotFound(format!("weight config {}", config_id)));
            }
            Err(e) => return Err(e.into()),
        };

        let config = WeightConfig::from_toml_str(&content)?;
        if config.id != config_id {
            return Err(ReadinessError::InvalidWeightConfig {
                config_id: config_id.to_string(),
                message: format!("file declares id '{}'", config.id),
            });
        }
        debug!("Loaded weight config {} from {}", config_id, path.display());
        Ok(config)
    }
}
