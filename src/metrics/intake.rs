//! Intake Phase Metrics
//!
//! Schema validation outcomes and normalization quality.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

/// Metrics collection for the intake phase (validate + normalize)
pub struct IntakeMetrics;

impl IntakeMetrics {
    /// Record an accepted table
    pub fn record_validation_success(rows: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "intake", "datasets_accepted")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "intake", "rows_per_dataset"))
            .record(rows as f64);
        ::metrics::histogram!(phase_metric!(histogram, "intake", "validation_duration_seconds"))
            .record(duration_secs);
    }

    /// Record a structurally rejected table
    pub fn record_rejection(error_code: &'static str) {
        ::metrics::counter!(
            phase_metric!(counter, "intake", "datasets_rejected"),
            "error" => error_code
        )
        .increment(1);
    }

    /// Record the outcome of normalizing one dataset
    pub fn record_normalization(
        accepted_rows: usize,
        excluded_rows: usize,
        warnings: usize,
        errors: usize,
        quality_score: f64,
    ) {
        ::metrics::counter!(phase_metric!(counter, "intake", "rows_accepted"))
            .increment(accepted_rows as u64);
        ::metrics::counter!(phase_metric!(counter, "intake", "rows_excluded"))
            .increment(excluded_rows as u64);
        ::metrics::counter!(phase_metric!(counter, "intake", "warning_issues"))
            .increment(warnings as u64);
        ::metrics::counter!(phase_metric!(counter, "intake", "error_issues"))
            .increment(errors as u64);
        ::metrics::gauge!(phase_metric!(gauge, "intake", "last_quality_score")).set(quality_score);
    }
}

impl PhaseMetrics for IntakeMetrics {
    fn register_metrics() {
        use metrics::{describe_counter, describe_gauge, describe_histogram};

        describe_counter!(
            phase_metric!(counter, "intake", "datasets_accepted"),
            "Tables accepted by schema validation"
        );
        describe_counter!(
            phase_metric!(counter, "intake", "datasets_rejected"),
            "Tables rejected by schema validation"
        );
        describe_counter!(
            phase_metric!(counter, "intake", "rows_accepted"),
            "Rows passing normalization"
        );
        describe_counter!(
            phase_metric!(counter, "intake", "rows_excluded"),
            "Rows excluded by an error-severity issue"
        );
        describe_counter!(
            phase_metric!(counter, "intake", "warning_issues"),
            "Warning-severity cell issues"
        );
        describe_counter!(
            phase_metric!(counter, "intake", "error_issues"),
            "Error-severity cell issues"
        );
        describe_histogram!(
            phase_metric!(histogram, "intake", "rows_per_dataset"),
            "Rows per accepted dataset"
        );
        describe_histogram!(
            phase_metric!(histogram, "intake", "validation_duration_seconds"),
            "Schema validation duration"
        );
        describe_gauge!(
            phase_metric!(gauge, "intake", "last_quality_score"),
            "Quality score of the most recently normalized dataset"
        );
    }

    fn phase_name() -> &'static str {
        "intake"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "intake", "datasets_accepted"),
                metric_type: MetricType::Counter,
                help: "Tables accepted by schema validation",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "intake", "datasets_rejected"),
                metric_type: MetricType::Counter,
                help: "Tables rejected by schema validation",
                labels: vec!["error"],
            },
            MetricDoc {
                name: phase_metric!(counter, "intake", "rows_accepted"),
                metric_type: MetricType::Counter,
                help: "Rows passing normalization",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "intake", "rows_excluded"),
                metric_type: MetricType::Counter,
                help: "Rows excluded by an error-severity issue",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "intake", "warning_issues"),
                metric_type: MetricType::Counter,
                help: "Warning-severity cell issues",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "intake", "error_issues"),
                metric_type: MetricType::Counter,
                help: "Error-severity cell issues",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "intake", "rows_per_dataset"),
                metric_type: MetricType::Histogram,
                help: "Rows per accepted dataset",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "intake", "validation_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Schema validation duration",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(gauge, "intake", "last_quality_score"),
                metric_type: MetricType::Gauge,
                help: "Quality score of the most recently normalized dataset",
                labels: vec![],
            },
        ]
    }
}
