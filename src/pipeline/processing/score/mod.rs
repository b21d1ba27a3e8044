pub mod weights;

pub use weights::WeightConfig;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{SCORE_MAX, SCORE_MIN};
use crate::domain::{Metric, MetricRow};
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::rescale::RescaledDataset;

/// One metric's weighted share of a region's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricContribution {
    pub metric: Metric,
    pub weight: f64,
    /// Rescaled value in [0,1]
    pub rescaled: f64,
    pub contribution: f64,
}

/// Composite score for one region under one weight config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub region_id: String,
    pub config_id: String,
    /// Clamped to [0,100]; `None` when the region has no usable metric
    pub score: Option<f64>,
    /// Sum of all contributions before clamping
    pub unclamped: Option<f64>,
    /// One entry per metric defined for this region
    pub contributions: Vec<MetricContribution>,
    pub insufficient_metrics: bool,
}

impl ScoreResult {
    pub fn contribution_sum(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }
}

/// Score a single rescaled row.
///
/// Metrics undefined for the row are excluded from both the weighted sum and
/// the weight denominator.
pub fn score_row(row: &MetricRow, weights: &WeightConfig) -> Result<ScoreResult> {
    let defined: Vec<(Metric, f64, f64)> = row
        .metrics
        .iter()
        .filter_map(|(metric, value)| value.value().map(|v| (*metric, weights.weight(*metric), v)))
        .collect();

    let weight_sum: f64 = defined.iter().map(|(_, w, _)| w).sum();
    if defined.is_empty() || weight_sum == 0.0 {
        debug!(region = %row.region_id, "Region has no weighted metric");
        return Ok(ScoreResult {
            region_id: row.region_id.clone(),
            config_id: weights.id.clone(),
            score: None,
            unclamped: None,
            contributions: Vec::new(),
            insufficient_metrics: true,
        });
    }

    let contributions: Vec<MetricContribution> = defined
        .iter()
        .map(|&(metric, weight, rescaled)| MetricContribution {
            metric,
            weight,
            rescaled,
            contribution: 100.0 * weight * rescaled / weight_sum,
        })
        .collect();

    let weighted: f64 = defined.iter().map(|(_, w, v)| w * v).sum();
    let unclamped = 100.0 * weighted / weight_sum;

    if !unclamped.is_finite() || contributions.iter().any(|c| !c.contribution.is_finite()) {
        return Err(ReadinessError::ScoreComputation {
            region: row.region_id.clone(),
            message: format!(
                "non-finite result (weighted sum {}, weight sum {})",
                weighted, weight_sum
            ),
        });
    }

    Ok(ScoreResult {
        region_id: row.region_id.clone(),
        config_id: weights.id.clone(),
        score: Some(unclamped.clamp(SCORE_MIN, SCORE_MAX)),
        unclamped: Some(unclamped),
        contributions,
        insufficient_metrics: false,
    })
}

/// Score every row; a single failing row fails the whole set
pub fn score_dataset(rescaled: &RescaledDataset, weights: &WeightConfig) -> Result<Vec<ScoreResult>> {
    rescaled
        .rows
        .iter()
        .map(|row| score_row(row, weights))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CONTRIBUTION_TOLERANCE;
    use crate::domain::MetricValue;

    fn row(values: &[(Metric, MetricValue)]) -> MetricRow {
        MetricRow {
            region_id: "A".to_string(),
            metrics: values.iter().copied().collect(),
        }
    }

    fn three_metric_weights() -> WeightConfig {
        WeightConfig::new(
            "w1",
            [
                (Metric::UtilizationRate, 1.0),
                (Metric::AvailabilityIndex, 1.0),
                (Metric::EquipmentIndex, 1.0),
            ],
        )
    }

    #[test]
    fn test_weighted_average_over_defined_metrics() {
        let r = row(&[
            (Metric::UtilizationRate, MetricValue::Defined(1.0)),
            (Metric::AvailabilityIndex, MetricValue::Defined(0.0)),
            (Metric::EquipmentIndex, MetricValue::Defined(1.0)),
        ]);
        let result = score_row(&r, &three_metric_weights()).unwrap();
        let score = result.score.unwrap();
        assert!((score - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.config_id, "w1");
        assert!(!result.insufficient_metrics);
    }

    #[test]
    fn test_undefined_metric_leaves_denominator() {
        let r = row(&[
            (Metric::UtilizationRate, MetricValue::Defined(1.0)),
            (Metric::AvailabilityIndex, MetricValue::Undefined),
            (Metric::EquipmentIndex, MetricValue::Defined(0.5)),
        ]);
        let result = score_row(&r, &three_metric_weights()).unwrap();
        assert!((result.score.unwrap() - 75.0).abs() < 1e-9);
        assert_eq!(result.contributions.len(), 2);
    }

    #[test]
    fn test_contributions_sum_to_unclamped_score() {
        let weights = WeightConfig::new(
            "mixed",
            [
                (Metric::UtilizationRate, 0.3),
                (Metric::BedsPerCapita, 1.7),
                (Metric::StaffingRatio, 0.9),
                (Metric::BudgetPerCapita, 2.2),
            ],
        );
        let r = row(&[
            (Metric::UtilizationRate, MetricValue::Defined(0.13)),
            (Metric::BedsPerCapita, MetricValue::Defined(0.77)),
            (Metric::StaffingRatio, MetricValue::Defined(0.41)),
            (Metric::BudgetPerCapita, MetricValue::Defined(0.99)),
            (Metric::EquipmentIndex, MetricValue::Defined(0.5)),
        ]);
        let result = score_row(&r, &weights).unwrap();
        let unclamped = result.unclamped.unwrap();
        assert!((result.contribution_sum() - unclamped).abs() < CONTRIBUTION_TOLERANCE);
        assert!((0.0..=100.0).contains(&result.score.unwrap()));
        // Zero-weight metrics are still listed with a zero contribution
        assert!(result
            .contributions
            .iter()
            .any(|c| c.metric == Metric::EquipmentIndex && c.contribution == 0.0));
    }

    #[test]
    fn test_all_undefined_is_flagged_not_zero() {
        let r = row(&[
            (Metric::UtilizationRate, MetricValue::Undefined),
            (Metric::AvailabilityIndex, MetricValue::Undefined),
        ]);
        let result = score_row(&r, &three_metric_weights()).unwrap();
        assert_eq!(result.score, None);
        assert!(result.insufficient_metrics);
        assert!(result.contributions.is_empty());
    }

    #[test]
    fn test_only_zero_weight_metrics_defined_is_flagged() {
        let r = row(&[(Metric::StaffingRatio, MetricValue::Defined(0.4))]);
        let result = score_row(&r, &three_metric_weights()).unwrap();
        assert_eq!(result.score, None);
        assert!(result.insufficient_metrics);
    }

    #[test]
    fn test_overflowing_weights_fail_the_row() {
        let weights = WeightConfig::new(
            "huge",
            [
                (Metric::UtilizationRate, f64::MAX),
                (Metric::EquipmentIndex, f64::MAX),
            ],
        );
        let r = row(&[
            (Metric::UtilizationRate, MetricValue::Defined(1.0)),
            (Metric::EquipmentIndex, MetricValue::Defined(1.0)),
        ]);
        assert!(matches!(
            score_row(&r, &weights),
            Err(ReadinessError::ScoreComputation { .. })
        ));
    }
}
