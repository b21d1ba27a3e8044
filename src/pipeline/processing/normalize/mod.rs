pub mod vocabulary;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{EQUIPMENT_SCALE, FIELD_COUNT};
use crate::domain::{Cell, Dataset, Field, RawRow, RegionRecord};

/// Shape of a plain decimal once separators and currency symbols are stripped
static NUMERIC_SHAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").ok());

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

/// Severity of a per-cell issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Value was repaired; row proceeds
    Warning,
    /// Value is unusable; row is excluded from scoring
    Error,
}

/// A single per-cell finding from normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    /// Zero-based row index in dataset order
    pub row: usize,
    pub column: Field,
    pub message: String,
    pub severity: IssueSeverity,
}

/// What to do with a missing numeric cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingValueStrategy {
    /// Substitute 0 and record a warning
    #[default]
    DefaultZero,
    /// Record an error and exclude the row
    ExcludeRow,
}

/// Outcome of normalizing a whole dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationReport {
    /// Accepted rows in dataset order
    pub records: Vec<RegionRecord>,
    /// Dataset row indices excluded because of an error-severity issue
    pub excluded_rows: Vec<usize>,
    pub issues: Vec<ValidationIssue>,
    /// 1 - (error issues / total cells)
    pub quality_score: f64,
    pub total_cells: usize,
}

impl NormalizationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }

    pub fn is_partial(&self) -> bool {
        !self.excluded_rows.is_empty()
    }
}

/// Trait for repairing raw cells into typed region records
pub trait Normalizer {
    fn normalize(&self, dataset: &Dataset) -> NormalizationReport;
}

/// Default normalizer: numeric coercion plus a configurable missing-value policy
#[derive(Debug, Clone, Default)]
pub struct DefaultNormalizer {
    pub missing_values: MissingValueStrategy,
}

impl DefaultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(missing_values: MissingValueStrategy) -> Self {
        Self { missing_values }
    }

    /// Normalize one row, pushing any issues found
    fn normalize_row(
        &self,
        index: usize,
        row: &RawRow,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<RegionRecord> {
        let before = issues.len();

        let region_id = row.region_label();
        if region_id.is_none() {
            issues.push(ValidationIssue {
                row: index,
                column: Field::Region,
                message: "missing region identifier".to_string(),
                severity: IssueSeverity::Error,
            });
        }

        let mut numbers = [0.0_f64; FIELD_COUNT];
        for field in Field::ALL.into_iter().filter(|f| !f.is_identifier()) {
            let value = self.numeric_cell(index, field, row.get(field), issues);
            if let (Some(value), Some(slot)) = (value, numbers.get_mut(field.index())) {
                *slot = value;
            }
        }

        let has_error = issues
            .get(before..)
            .unwrap_or_default()
            .iter()
            .any(|i| i.severity == IssueSeverity::Error);
        if has_error {
            debug!(row = index, "Row excluded by normalization");
            return None;
        }

        let get = |field: Field| numbers.get(field.index()).copied().unwrap_or(0.0);
        Some(RegionRecord {
            region_id: region_id.unwrap_or_default(),
            total_beds: get(Field::TotalBeds),
            occupied_beds: get(Field::OccupiedBeds),
            available_beds: get(Field::AvailableBeds),
            staff_count: get(Field::StaffCount),
            equipment_score: get(Field::EquipmentScore),
            population: get(Field::Population),
            budget_allocation: get(Field::BudgetAllocation),
        })
    }

    /// Coerce one numeric cell, applying the missing-value policy and range checks
    fn numeric_cell(
        &self,
        row: usize,
        column: Field,
        cell: &Cell,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<f64> {
        let mut issue = |message: String, severity: IssueSeverity| {
            issues.push(ValidationIssue {
                row,
                column,
                message,
                severity,
            })
        };

        if cell.is_missing() {
            return match self.missing_values {
                MissingValueStrategy::DefaultZero => {
                    issue("missing value defaulted to 0".to_string(), IssueSeverity::Warning);
                    Some(0.0)
                }
                MissingValueStrategy::ExcludeRow => {
                    issue("missing value".to_string(), IssueSeverity::Error);
                    None
                }
            };
        }

        let value = match cell {
            Cell::Number(n) => Some(*n),
            Cell::Text(text) => coerce_numeric(text),
            Cell::Empty => None,
        };

        let Some(value) = value.filter(|v| v.is_finite()) else {
            issue(format!("'{}' is not a number", render(cell)), IssueSeverity::Error);
            return None;
        };

        if value < 0.0 {
            issue(format!("{} must be non-negative", value), IssueSeverity::Error);
            return None;
        }
        if column == Field::EquipmentScore && value > EQUIPMENT_SCALE {
            issue(
                format!("{} is outside 0..={}", value, EQUIPMENT_SCALE),
                IssueSeverity::Error,
            );
            return None;
        }

        Some(value)
    }
}

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, dataset: &Dataset) -> NormalizationReport {
        let mut issues = Vec::new();
        let mut records = Vec::with_capacity(dataset.rows.len());
        let mut excluded_rows = Vec::new();

        for (index, row) in dataset.rows.iter().enumerate() {
            match self.normalize_row(index, row, &mut issues) {
                Some(record) => records.push(record),
                None => excluded_rows.push(index),
            }
        }

        let total_cells = dataset.rows.len() * FIELD_COUNT;
        let errors = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
            .count();
        let quality_score = if total_cells == 0 {
            0.0
        } else {
            1.0 - errors as f64 / total_cells as f64
        };

        NormalizationReport {
            records,
            excluded_rows,
            issues,
            quality_score,
            total_cells,
        }
    }
}

/// Coerce a numeric-looking string such as " $1,200.50 " into a number
pub fn coerce_numeric(text: &str) -> Option<f64> {
    let stripped: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if !NUMERIC_SHAPE
        .as_ref()
        .is_some_and(|re| re.is_match(&stripped))
    {
        return None;
    }
    stripped.parse::<f64>().ok()
}

fn render(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) => n.to_string(),
        Cell::Text(s) => s.clone(),
        Cell::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DatasetId;
    use chrono::Utc;

    fn dataset(rows: Vec<Vec<Cell>>) -> Dataset {
        Dataset {
            id: DatasetId::from("ds"),
            created_at: Utc::now(),
            rows: rows.into_iter().map(RawRow::from_canonical).collect(),
        }
    }

    fn good_row(region: &str) -> Vec<Cell> {
        vec![
            Cell::from(region),
            Cell::from(100.0),
            Cell::from(80.0),
            Cell::from(20.0),
            Cell::from(50.0),
            Cell::from(8.0),
            Cell::from(1_000_000.0),
            Cell::from(500_000.0),
        ]
    }

    #[test]
    fn test_coerce_numeric_strings() {
        assert!(NUMERIC_SHAPE.is_some());
        assert_eq!(coerce_numeric(" 1,200 "), Some(1200.0));
        assert_eq!(coerce_numeric("$500,000.50"), Some(500_000.5));
        assert_eq!(coerce_numeric("€ 12"), Some(12.0));
        assert_eq!(coerce_numeric("-3"), Some(-3.0));
        assert_eq!(coerce_numeric("1e3"), Some(1000.0));
        assert_eq!(coerce_numeric("inf"), None);
        assert_eq!(coerce_numeric("NaN"), None);
        assert_eq!(coerce_numeric("twelve"), None);
    }

    #[test]
    fn test_clean_dataset_has_perfect_quality() {
        let report = DefaultNormalizer::new().normalize(&dataset(vec![good_row("A")]));
        assert_eq!(report.records.len(), 1);
        assert!(report.issues.is_empty());
        assert_eq!(report.quality_score, 1.0);
        assert_eq!(report.records[0].total_beds, 100.0);
    }

    #[test]
    fn test_text_numbers_are_coerced() {
        let mut row = good_row("A");
        row[7] = Cell::from(" $500,000 ");
        row[1] = Cell::from("100");
        let report = DefaultNormalizer::new().normalize(&dataset(vec![row]));
        assert!(report.issues.is_empty());
        assert_eq!(report.records[0].budget_allocation, 500_000.0);
        assert_eq!(report.records[0].total_beds, 100.0);
    }

    #[test]
    fn test_missing_numeric_defaults_to_zero_with_warning() {
        let mut row = good_row("A");
        row[4] = Cell::Empty;
        let report = DefaultNormalizer::new().normalize(&dataset(vec![row]));
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].staff_count, 0.0);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.issues[0].column, Field::StaffCount);
        // Warnings do not lower the quality score
        assert_eq!(report.quality_score, 1.0);
    }

    #[test]
    fn test_exclude_row_strategy_turns_missing_into_error() {
        let mut row = good_row("A");
        row[4] = Cell::from(" ");
        let normalizer = DefaultNormalizer::with_strategy(MissingValueStrategy::ExcludeRow);
        let report = normalizer.normalize(&dataset(vec![row, good_row("B")]));
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.excluded_rows, vec![0]);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_missing_region_excludes_row_and_lowers_quality() {
        let mut row = good_row("");
        row[0] = Cell::Empty;
        let report = DefaultNormalizer::new().normalize(&dataset(vec![row, good_row("B")]));
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].region_id, "B");
        assert_eq!(report.excluded_rows, vec![0]);
        assert!(report.is_partial());
        assert!((report.quality_score - (1.0 - 1.0 / 16.0)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let mut negative = good_row("A");
        negative[2] = Cell::from(-5.0);
        let mut garbage = good_row("B");
        garbage[6] = Cell::from("lots");
        let mut equipment = good_row("C");
        equipment[5] = Cell::from(11.0);
        let report =
            DefaultNormalizer::new().normalize(&dataset(vec![negative, garbage, equipment]));
        assert!(report.records.is_empty());
        assert_eq!(report.error_count(), 3);
        assert!(report
            .issues
            .iter()
            .all(|i| i.severity == IssueSeverity::Error));
    }
}
