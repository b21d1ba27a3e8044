//! Metrics registry for coordinating phase-specific metrics
//!
//! Registers every phase's metrics, validates naming consistency, and
//! detects conflicts early.

use crate::metrics::{IntakeMetrics, LedgerMetrics, MetricDoc, PhaseMetrics, ScoringMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Register all metrics from all phases. Returns the names found in more
/// than one phase.
pub fn register_all_metrics() -> Vec<&'static str> {
    let mut all_metrics = HashMap::new();
    let mut conflicts = Vec::new();

    register_phase_metrics::<IntakeMetrics>(&mut all_metrics, &mut conflicts);
    register_phase_metrics::<ScoringMetrics>(&mut all_metrics, &mut conflicts);
    register_phase_metrics::<LedgerMetrics>(&mut all_metrics, &mut conflicts);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );
    conflicts
}

/// Register metrics for a specific phase and detect conflicts
fn register_phase_metrics<T: PhaseMetrics>(
    all_metrics: &mut HashMap<&'static str, (&'static str, MetricDoc)>,
    conflicts: &mut Vec<&'static str>,
) {
    T::register_metrics();
    let phase_name = T::phase_name();
    let phase_docs = T::metrics_documentation();

    debug!(
        "Registering {} metrics for phase '{}'",
        phase_docs.len(),
        phase_name
    );

    for doc in phase_docs {
        if !doc.name.starts_with(&format!("readiness_{}_", phase_name)) {
            warn!(
                "Metric '{}' does not carry the '{}' phase prefix",
                doc.name, phase_name
            );
        }
        if let Some((owner, _)) = all_metrics.get(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' is defined in both '{}' and '{}'",
                doc.name, owner, phase_name
            );
            conflicts.push(doc.name);
        } else {
            all_metrics.insert(doc.name, (phase_name, doc));
        }
    }
}

/// Extract phase name from metric name (e.g., "readiness_ledger_entries_total" -> "ledger")
pub fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    metric_name
        .strip_prefix("readiness_")
        .and_then(|rest| rest.split('_').next())
        .filter(|phase| !phase.is_empty())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_conflicts_between_phases() {
        assert!(register_all_metrics().is_empty());
    }

    #[test]
    fn test_every_metric_is_prefixed_with_its_phase() {
        for doc in IntakeMetrics::metrics_documentation() {
            assert_eq!(extract_phase_from_metric_name(doc.name), "intake");
        }
        for doc in ScoringMetrics::metrics_documentation() {
            assert_eq!(extract_phase_from_metric_name(doc.name), "scoring");
        }
        for doc in LedgerMetrics::metrics_documentation() {
            assert_eq!(extract_phase_from_metric_name(doc.name), "ledger");
        }
    }

    #[test]
    fn test_extract_phase_from_metric_name() {
        assert_eq!(
            extract_phase_from_metric_name("readiness_scoring_duration_seconds"),
            "scoring"
        );
        assert_eq!(
            extract_phase_from_metric_name("invalid_metric_name"),
            "unknown"
        );
    }
}
