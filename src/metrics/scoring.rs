//! Scoring Phase Metrics
//!
//! Derivation, rescaling, weighted scoring and factor ranking.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the scoring phase
pub struct ScoringMetrics;

impl ScoringMetrics {
    /// Record a dataset prepared for scoring
    pub fn record_prepared(rows: usize, undefined_values: usize) {
        ::metrics::counter!(phase_metric!(counter, "scoring", "datasets_prepared")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "scoring", "undefined_values"))
            .increment(undefined_values as u64);
        ::metrics::histogram!(phase_metric!(histogram, "scoring", "rows_prepared"))
            .record(rows as f64);
    }

    /// Record a committed scoring run
    pub fn record_run_committed(rows: usize, insufficient: usize, partial: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "scoring", "runs_committed")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "scoring", "insufficient_regions"))
            .increment(insufficient as u64);
        ::metrics::counter!(phase_metric!(counter, "scoring", "partial_explanations"))
            .increment(partial as u64);
        ::metrics::histogram!(phase_metric!(histogram, "scoring", "regions_per_run"))
            .record(rows as f64);
        ::metrics::histogram!(phase_metric!(histogram, "scoring", "duration_seconds"))
            .record(duration_secs);
    }

    /// Record a scoring run that committed nothing
    pub fn record_run_failed(reason: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "scoring", "runs_failed"),
            "reason" => reason
        )
        .increment(1);
    }
}

impl PhaseMetrics for ScoringMetrics {
    fn register_metrics() {
        use metrics::{describe_counter, describe_histogram};

        for doc in Self::metrics_documentation() {
            match doc.metric_type {
                MetricType::Counter => describe_counter!(doc.name, doc.help),
                MetricType::Histogram => describe_histogram!(doc.name, doc.help),
                MetricType::Gauge => {}
            }
        }
    }

    fn phase_name() -> &'static str {
        "scoring"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "scoring", "datasets_prepared"),
                metric_type: MetricType::Counter,
                help: "Datasets normalized, derived and rescaled",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "scoring", "undefined_values"),
                metric_type: MetricType::Counter,
                help: "Derived metric values left undefined by a zero denominator",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "scoring", "runs_committed"),
                metric_type: MetricType::Counter,
                help: "Scoring runs whose snapshot was committed",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "scoring", "runs_failed"),
                metric_type: MetricType::Counter,
                help: "Scoring runs rolled back or rejected",
                labels: vec!["reason"],
            },
            MetricDoc {
                name: phase_metric!(counter, "scoring", "insufficient_regions"),
                metric_type: MetricType::Counter,
                help: "Regions scored null for lack of weighted metrics",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "scoring", "partial_explanations"),
                metric_type: MetricType::Counter,
                help: "Regions explained by fewer than three factors",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "scoring", "rows_prepared"),
                metric_type: MetricType::Histogram,
                help: "Rows per prepared dataset",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "scoring", "regions_per_run"),
                metric_type: MetricType::Histogram,
                help: "Regions per committed scoring run",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "scoring", "duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Scoring run duration",
                labels: vec![],
            },
        ]
    }
}
