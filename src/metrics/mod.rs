//! Centralized metrics for the readiness pipeline
//!
//! Each pipeline phase defines its metrics in a dedicated submodule, so every
//! metric has one owner and names cannot collide. Values are recorded through
//! the `metrics` facade; without an installed recorder they are no-ops.

pub mod intake;
pub mod ledger;
pub mod registry;
pub mod scoring;

pub use intake::IntakeMetrics;
pub use ledger::LedgerMetrics;
pub use scoring::ScoringMetrics;

/// Trait for phase-specific metrics collections
///
/// Each pipeline phase implements this trait to provide:
/// - Metric registration at startup
/// - Consistent naming conventions
/// - Documentation of what each metric measures
pub trait PhaseMetrics {
    /// Register all metrics for this phase
    fn register_metrics();

    /// Get the phase name for prefixing metrics
    fn phase_name() -> &'static str;

    /// Get documentation for all metrics in this phase
    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Macro to create phase-specific metric names with consistent naming
///
/// All metrics follow the naming convention:
/// readiness_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("readiness_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("readiness_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("readiness_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
