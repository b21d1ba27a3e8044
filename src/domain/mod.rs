use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::constants::*;

/// One of the eight raw fields of a region row, in canonical column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Region,
    TotalBeds,
    OccupiedBeds,
    AvailableBeds,
    StaffCount,
    EquipmentScore,
    Population,
    BudgetAllocation,
}

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Region,
        Field::TotalBeds,
        Field::OccupiedBeds,
        Field::AvailableBeds,
        Field::StaffCount,
        Field::EquipmentScore,
        Field::Population,
        Field::BudgetAllocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Region => FIELD_REGION,
            Field::TotalBeds => FIELD_TOTAL_BEDS,
            Field::OccupiedBeds => FIELD_OCCUPIED_BEDS,
            Field::AvailableBeds => FIELD_AVAILABLE_BEDS,
            Field::StaffCount => FIELD_STAFF_COUNT,
            Field::EquipmentScore => FIELD_EQUIPMENT_SCORE,
            Field::Population => FIELD_POPULATION,
            Field::BudgetAllocation => FIELD_BUDGET_ALLOCATION,
        }
    }

    /// Position of this field inside a `RawRow`
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Field::Region)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A derived ratio metric. Ordering of the enum is irrelevant for ranking;
/// ties are broken on `as_str()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "utilizationRate")]
    UtilizationRate,
    #[serde(rename = "bedsPerCapita")]
    BedsPerCapita,
    #[serde(rename = "staffingRatio")]
    StaffingRatio,
    #[serde(rename = "equipmentIndex")]
    EquipmentIndex,
    #[serde(rename = "availabilityIndex")]
    AvailabilityIndex,
    #[serde(rename = "budgetPerCapita")]
    BudgetPerCapita,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::UtilizationRate,
        Metric::BedsPerCapita,
        Metric::StaffingRatio,
        Metric::EquipmentIndex,
        Metric::AvailabilityIndex,
        Metric::BudgetPerCapita,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::UtilizationRate => METRIC_UTILIZATION_RATE,
            Metric::BedsPerCapita => METRIC_BEDS_PER_CAPITA,
            Metric::StaffingRatio => METRIC_STAFFING_RATIO,
            Metric::EquipmentIndex => METRIC_EQUIPMENT_INDEX,
            Metric::AvailabilityIndex => METRIC_AVAILABILITY_INDEX,
            Metric::BudgetPerCapita => METRIC_BUDGET_PER_CAPITA,
        }
    }

    pub fn from_name(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.as_str() == name.trim())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric value that may be undefined (zero denominator).
/// Undefined is never collapsed into zero anywhere in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    Defined(f64),
    Undefined,
}

impl MetricValue {
    pub fn value(&self) -> Option<f64> {
        match self {
            MetricValue::Defined(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, MetricValue::Defined(_))
    }
}

/// Untyped cell as handed over by the transport layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Treats null and whitespace-only text as missing
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text rendering used for identifiers
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// A parsed but unvalidated table of rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Caller-chosen dataset identifier; a fresh one is generated when absent
    #[serde(default)]
    pub dataset_id: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Identifier of an accepted dataset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub String);

impl DatasetId {
    pub fn generate() -> Self {
        DatasetId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DatasetId {
    fn from(value: &str) -> Self {
        DatasetId(value.to_string())
    }
}

/// One region's eight raw cells, stored in canonical `Field` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<Cell>,
}

impl RawRow {
    /// Build from cells already arranged in `Field::ALL` order
    pub(crate) fn from_canonical(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, field: Field) -> &Cell {
        self.cells.get(field.index()).unwrap_or(&Cell::Empty)
    }

    pub fn region_label(&self) -> Option<String> {
        self.get(Field::Region).as_text()
    }
}

/// A structurally valid dataset. Immutable once accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub created_at: DateTime<Utc>,
    pub rows: Vec<RawRow>,
}

/// A cleaned, typed region row produced by the Normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub region_id: String,
    pub total_beds: f64,
    pub occupied_beds: f64,
    pub available_beds: f64,
    pub staff_count: f64,
    pub equipment_score: f64,
    pub population: f64,
    pub budget_allocation: f64,
}

/// A per-region map of metric values (derived or rescaled)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub region_id: String,
    pub metrics: BTreeMap<Metric, MetricValue>,
}

impl MetricRow {
    pub fn get(&self, metric: Metric) -> MetricValue {
        self.metrics
            .get(&metric)
            .copied()
            .unwrap_or(MetricValue::Undefined)
    }

    pub fn defined_count(&self) -> usize {
        self.metrics.values().filter(|v| v.is_defined()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_deserializes_from_json_scalars() {
        let cells: Vec<Cell> = serde_json::from_str(r#"[1.5, "x", null]"#).unwrap();
        assert_eq!(cells[0], Cell::Number(1.5));
        assert_eq!(cells[1], Cell::Text("x".to_string()));
        assert_eq!(cells[2], Cell::Empty);
    }

    #[test]
    fn test_metric_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Metric::AvailabilityIndex).unwrap();
        assert_eq!(json, "\"availabilityIndex\"");
        assert_eq!(Metric::from_name("equipmentIndex"), Some(Metric::EquipmentIndex));
        assert_eq!(Metric::from_name("nope"), None);
    }

    #[test]
    fn test_missing_cells() {
        assert!(Cell::Empty.is_missing());
        assert!(Cell::from("   ").is_missing());
        assert!(!Cell::from(0.0).is_missing());
        assert_eq!(Cell::from("  North ").as_text().as_deref(), Some("North"));
    }
}
