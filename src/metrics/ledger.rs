//! Ledger Phase Metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for provenance ledger writes
pub struct LedgerMetrics;

impl LedgerMetrics {
    pub fn record_append(stage: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ledger", "entries"), "stage" => stage)
            .increment(1);
    }

    pub fn record_append_error(stage: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ledger", "append_errors"), "stage" => stage)
            .increment(1);
    }
}

impl PhaseMetrics for LedgerMetrics {
    fn register_metrics() {
        use metrics::describe_counter;

        describe_counter!(
            phase_metric!(counter, "ledger", "entries"),
            "Provenance entries appended"
        );
        describe_counter!(
            phase_metric!(counter, "ledger", "append_errors"),
            "Provenance entries rejected by the sink"
        );
    }

    fn phase_name() -> &'static str {
        "ledger"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ledger", "entries"),
                metric_type: MetricType::Counter,
                help: "Provenance entries appended",
                labels: vec!["stage"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ledger", "append_errors"),
                metric_type: MetricType::Counter,
                help: "Provenance entries rejected by the sink",
                labels: vec!["stage"],
            },
        ]
    }
}
