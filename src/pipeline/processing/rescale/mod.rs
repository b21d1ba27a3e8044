//! Dataset-relative min–max rescaling.
//!
//! Two passes: collect per-metric extrema over every row with a defined value,
//! then map each defined value into [0,1]. No spread maps to the neutral midpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::NEUTRAL_MIDPOINT;
use crate::domain::{Metric, MetricRow, MetricValue};

/// Observed range of one metric across a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
    /// Rows contributing a defined value
    pub defined: usize,
}

impl MetricRange {
    pub fn rescale(&self, value: f64) -> f64 {
        let spread = self.max - self.min;
        if spread == 0.0 {
            return NEUTRAL_MIDPOINT;
        }
        ((value - self.min) / spread).clamp(0.0, 1.0)
    }
}

/// Rescaled rows plus the extrema they were rescaled against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescaledDataset {
    pub rows: Vec<MetricRow>,
    pub ranges: BTreeMap<Metric, MetricRange>,
}

impl RescaledDataset {
    pub fn row(&self, region_id: &str) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.region_id == region_id)
    }
}

/// First pass: extrema per metric over defined values only
pub fn collect_ranges(rows: &[MetricRow]) -> BTreeMap<Metric, MetricRange> {
    let mut ranges: BTreeMap<Metric, MetricRange> = BTreeMap::new();
    for row in rows {
        for (metric, value) in &row.metrics {
            let Some(v) = value.value() else { continue };
            ranges
                .entry(*metric)
                .and_modify(|r| {
                    r.min = r.min.min(v);
                    r.max = r.max.max(v);
                    r.defined += 1;
                })
                .or_insert(MetricRange {
                    min: v,
                    max: v,
                    defined: 1,
                });
        }
    }
    ranges
}

/// Second pass: rescale every defined value; undefined stays undefined
pub fn rescale_dataset(rows: &[MetricRow]) -> RescaledDataset {
    let ranges = collect_ranges(rows);

    let rescaled = rows
        .iter()
        .map(|row| {
            let metrics = row
                .metrics
                .iter()
                .map(|(metric, value)| {
                    let mapped = match (value, ranges.get(metric)) {
                        (MetricValue::Defined(v), Some(range)) => {
                            MetricValue::Defined(range.rescale(*v))
                        }
                        _ => MetricValue::Undefined,
                    };
                    (*metric, mapped)
                })
                .collect();
            MetricRow {
                region_id: row.region_id.clone(),
                metrics,
            }
        })
        .collect();

    RescaledDataset {
        rows: rescaled,
        ranges,
    }
}
