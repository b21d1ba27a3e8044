//! Derived ratio metrics computed from a single cleaned region record.
//!
//! Division by a zero denominator yields `MetricValue::Undefined`; it is never
//! coerced to zero or infinity.

use std::collections::BTreeMap;

use crate::constants::EQUIPMENT_SCALE;
use crate::domain::{Metric, MetricRow, MetricValue, RegionRecord};

fn ratio(numerator: f64, denominator: f64) -> MetricValue {
    if denominator == 0.0 {
        return MetricValue::Undefined;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        MetricValue::Defined(value)
    } else {
        MetricValue::Undefined
    }
}

/// Compute the six derived metrics for one record
pub fn derive_metrics(record: &RegionRecord) -> MetricRow {
    let metrics = BTreeMap::from([
        (
            Metric::UtilizationRate,
            ratio(record.occupied_beds, record.total_beds),
        ),
        (
            Metric::BedsPerCapita,
            ratio(record.total_beds, record.population),
        ),
        (
            Metric::StaffingRatio,
            ratio(record.staff_count, record.total_beds),
        ),
        (
            Metric::EquipmentIndex,
            MetricValue::Defined(record.equipment_score / EQUIPMENT_SCALE),
        ),
        (
            Metric::AvailabilityIndex,
            ratio(record.available_beds, record.total_beds),
        ),
        (
            Metric::BudgetPerCapita,
            ratio(record.budget_allocation, record.population),
        ),
    ]);

    MetricRow {
        region_id: record.region_id.clone(),
        metrics,
    }
}

/// Derive metrics for every accepted record, preserving order
pub fn derive_all(records: &[RegionRecord]) -> Vec<MetricRow> {
    records.iter().map(derive_metrics).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RegionRecord {
        RegionRecord {
            region_id: "A".to_string(),
            total_beds: 100.0,
            occupied_beds: 80.0,
            available_beds: 20.0,
            staff_count: 50.0,
            equipment_score: 8.0,
            population: 1_000_000.0,
            budget_allocation: 500_000.0,
        }
    }

    #[test]
    fn test_ratios() {
        let row = derive_metrics(&record());
        assert_eq!(row.get(Metric::UtilizationRate), MetricValue::Defined(0.8));
        assert_eq!(row.get(Metric::AvailabilityIndex), MetricValue::Defined(0.2));
        assert_eq!(row.get(Metric::StaffingRatio), MetricValue::Defined(0.5));
        assert_eq!(row.get(Metric::EquipmentIndex), MetricValue::Defined(0.8));
        assert_eq!(row.get(Metric::BedsPerCapita), MetricValue::Defined(0.0001));
        assert_eq!(row.get(Metric::BudgetPerCapita), MetricValue::Defined(0.5));
        assert_eq!(row.defined_count(), 6);
    }

    #[test]
    fn test_zero_beds_leaves_bed_ratios_undefined() {
        let mut r = record();
        r.total_beds = 0.0;
        let row = derive_metrics(&r);
        assert_eq!(row.get(Metric::UtilizationRate), MetricValue::Undefined);
        assert_eq!(row.get(Metric::AvailabilityIndex), MetricValue::Undefined);
        assert_eq!(row.get(Metric::StaffingRatio), MetricValue::Undefined);
        // Beds per capita has a population denominator and stays defined
        assert_eq!(row.get(Metric::BedsPerCapita), MetricValue::Defined(0.0));
        assert_eq!(row.defined_count(), 3);
    }

    #[test]
    fn test_zero_population_leaves_per_capita_undefined() {
        let mut r = record();
        r.population = 0.0;
        let row = derive_metrics(&r);
        assert_eq!(row.get(Metric::BedsPerCapita), MetricValue::Undefined);
        assert_eq!(row.get(Metric::BudgetPerCapita), MetricValue::Undefined);
        assert!(row.get(Metric::EquipmentIndex).is_defined());
    }

    #[test]
    fn test_derivation_is_deterministic() {
        assert_eq!(derive_metrics(&record()), derive_metrics(&record()));
    }
}
