use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::constants::TOP_FACTOR_COUNT;
use crate::domain::Metric;
use crate::pipeline::processing::score::{MetricContribution, ScoreResult};

/// One of the top-ranked drivers of a region's score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub metric: Metric,
    pub weight: f64,
    pub normalized_value: f64,
    pub contribution: f64,
    /// 1-based rank
    pub rank: usize,
}

/// Ranked factors for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRanking {
    pub region_id: String,
    pub config_id: String,
    pub factors: Vec<ContributingFactor>,
    /// Fewer than three metrics were defined; `factors` holds what exists
    pub partial: bool,
}

/// Descending absolute contribution, then ascending canonical metric name
fn by_influence(a: &MetricContribution, b: &MetricContribution) -> Ordering {
    b.contribution
        .abs()
        .total_cmp(&a.contribution.abs())
        .then_with(|| a.metric.as_str().cmp(b.metric.as_str()))
}

/// Select the top contributors of a score result
pub fn rank_factors(result: &ScoreResult) -> FactorRanking {
    let mut ordered: Vec<&MetricContribution> = result.contributions.iter().collect();
    ordered.sort_by(|a, b| by_influence(a, b));

    let factors: Vec<ContributingFactor> = ordered
        .into_iter()
        .take(TOP_FACTOR_COUNT)
        .enumerate()
        .map(|(i, c)| ContributingFactor {
            metric: c.metric,
            weight: c.weight,
            normalized_value: c.rescaled,
            contribution: c.contribution,
            rank: i + 1,
        })
        .collect();

    FactorRanking {
        region_id: result.region_id.clone(),
        config_id: result.config_id.clone(),
        partial: factors.len() < TOP_FACTOR_COUNT,
        factors,
    }
}

/// Rank every result, preserving region order
pub fn rank_all(results: &[ScoreResult]) -> Vec<FactorRanking> {
    results.iter().map(rank_factors).collect()
}
