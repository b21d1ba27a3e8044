//! Weight configuration for the composite readiness score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::Metric;
use crate::error::{ReadinessError, Result};

/// Named, immutable weight vector. A change of weights is a new `WeightConfig`
/// with a new id; instances are never mutated after a scoring run uses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub id: String,
    /// Metrics absent from the map carry weight 0
    #[serde(default)]
    pub weights: BTreeMap<Metric, f64>,
}

impl WeightConfig {
    pub fn new(id: impl Into<String>, weights: impl IntoIterator<Item = (Metric, f64)>) -> Self {
        Self {
            id: id.into(),
            weights: weights.into_iter().collect(),
        }
    }

    /// Every metric weighted 1.0
    pub fn uniform(id: impl Into<String>) -> Self {
        Self::new(id, Metric::ALL.into_iter().map(|m| (m, 1.0)))
    }

    pub fn weight(&self, metric: Metric) -> f64 {
        self.weights.get(&metric).copied().unwrap_or(0.0)
    }

    /// Reject negative or non-finite weights and all-zero vectors
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| ReadinessError::InvalidWeightConfig {
            config_id: self.id.clone(),
            message,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("config id must not be empty".to_string()));
        }
        for (metric, weight) in &self.weights {
            if !weight.is_finite() {
                return Err(invalid(format!("weight for {} is not finite", metric)));
            }
            if *weight < 0.0 {
                return Err(invalid(format!("weight for {} is negative", metric)));
            }
        }
        if !self.weights.values().any(|w| *w > 0.0) {
            return Err(invalid("at least one weight must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Parse a standalone weights file:
    ///
    /// ```toml
    /// id = "baseline-v2"
    /// [weights]
    /// utilizationRate = 1.0
    /// equipmentIndex = 0.5
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WeightConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}
