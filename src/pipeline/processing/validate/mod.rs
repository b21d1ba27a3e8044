use chrono::Utc;
use std::collections::HashSet;

use crate::constants::{FIELD_COUNT, MAX_ROWS};
use crate::domain::{Cell, Dataset, DatasetId, Field, RawRow, Table};
use crate::error::{ReadinessError, Result};
use crate::pipeline::processing::normalize::vocabulary::canonical_field;

/// Trait for the structural checks applied before any data is accepted
pub trait SchemaValidator {
    /// Accept the table as a `Dataset` or reject it entirely
    fn validate(&self, table: &Table, dataset_id: &DatasetId) -> Result<Dataset>;
}

/// Default validator: eight known columns, 1..=max_rows rows, unique regions
#[derive(Debug, Clone)]
pub struct DefaultSchemaValidator {
    pub max_rows: usize,
}

impl Default for DefaultSchemaValidator {
    fn default() -> Self {
        Self { max_rows: MAX_ROWS }
    }
}

impl DefaultSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map each declared column to its canonical field position
    fn column_layout(&self, table: &Table, dataset_id: &DatasetId) -> Result<Vec<Field>> {
        if table.columns.len() != FIELD_COUNT {
            return Err(schema_error(
                dataset_id,
                format!(
                    "expected {} columns, found {}",
                    FIELD_COUNT,
                    table.columns.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        let mut layout = Vec::with_capacity(FIELD_COUNT);
        for header in &table.columns {
            let field = canonical_field(header).ok_or_else(|| {
                schema_error(dataset_id, format!("unknown column '{}'", header.trim()))
            })?;
            if !seen.insert(field) {
                return Err(schema_error(
                    dataset_id,
                    format!("column '{}' maps to '{}' more than once", header.trim(), field),
                ));
            }
            layout.push(field);
        }
        Ok(layout)
    }

    fn check_size(&self, table: &Table, dataset_id: &DatasetId) -> Result<()> {
        let rows = table.rows.len();
        if rows == 0 || rows > self.max_rows {
            return Err(ReadinessError::Size {
                dataset_id: dataset_id.to_string(),
                rows,
                max: self.max_rows,
            });
        }
        Ok(())
    }

    /// Rearrange a row's cells into canonical field order
    fn canonical_row(
        &self,
        index: usize,
        cells: &[Cell],
        layout: &[Field],
        dataset_id: &DatasetId,
    ) -> Result<RawRow> {
        if cells.len() != layout.len() {
            return Err(schema_error(
                dataset_id,
                format!(
                    "row {} has {} fields, expected {}",
                    index,
                    cells.len(),
                    layout.len()
                ),
            ));
        }

        let mut ordered = vec![Cell::Empty; FIELD_COUNT];
        for (cell, field) in cells.iter().zip(layout) {
            if let Some(slot) = ordered.get_mut(field.index()) {
                *slot = cell.clone();
            }
        }
        Ok(RawRow::from_canonical(ordered))
    }
}

impl SchemaValidator for DefaultSchemaValidator {
    fn validate(&self, table: &Table, dataset_id: &DatasetId) -> Result<Dataset> {
        let layout = self.column_layout(table, dataset_id)?;
        self.check_size(table, dataset_id)?;

        let rows = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, cells)| self.canonical_row(i, cells, &layout, dataset_id))
            .collect::<Result<Vec<_>>>()?;

        // Blank identifiers are the Normalizer's concern, not a duplicate
        let mut regions = HashSet::new();
        for row in &rows {
            if let Some(region) = row.region_label() {
                if !regions.insert(region.clone()) {
                    return Err(ReadinessError::DuplicateKey {
                        dataset_id: dataset_id.to_string(),
                        region,
                    });
                }
            }
        }

        Ok(Dataset {
            id: dataset_id.clone(),
            created_at: Utc::now(),
            rows,
        })
    }
}

fn schema_error(dataset_id: &DatasetId, message: String) -> ReadinessError {
    ReadinessError::Schema {
        dataset_id: dataset_id.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        [
            "Region",
            "Total Beds",
            "occupied_beds",
            "available_beds",
            "staff_count",
            "equipment_score",
            "population",
            "budget_allocation",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn row(region: &str) -> Vec<Cell> {
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

    fn table(rows: Vec<Vec<Cell>>) -> Table {
        Table {
            dataset_id: None,
            columns: header(),
            rows,
        }
    }

    #[test]
    fn test_accepts_well_formed_table() {
        let validator = DefaultSchemaValidator::new();
        let id = DatasetId::from("ds-1");
        let dataset = validator
            .validate(&table(vec![row("A"), row("B")]), &id)
            .unwrap();
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.rows[0].region_label().as_deref(), Some("A"));
        assert_eq!(dataset.rows[1].get(Field::TotalBeds), &Cell::Number(100.0));
    }

    #[test]
    fn test_reorders_columns_into_canonical_order() {
        let validator = DefaultSchemaValidator::new();
        let mut t = table(vec![row("A")]);
        t.columns.swap(0, 7);
        t.rows[0].swap(0, 7);
        let dataset = validator.validate(&t, &DatasetId::from("ds")).unwrap();
        assert_eq!(dataset.rows[0].region_label().as_deref(), Some("A"));
        assert_eq!(
            dataset.rows[0].get(Field::BudgetAllocation),
            &Cell::Number(500_000.0)
        );
    }

    #[test]
    fn test_rejects_seven_columns() {
        let validator = DefaultSchemaValidator::new();
        let mut t = table(vec![row("A")]);
        t.columns.pop();
        let err = validator.validate(&t, &DatasetId::from("ds")).unwrap_err();
        assert!(matches!(err, ReadinessError::Schema { .. }));
    }

    #[test]
    fn test_rejects_unknown_and_repeated_headers() {
        let validator = DefaultSchemaValidator::new();
        let mut t = table(vec![row("A")]);
        t.columns[3] = "hospitals".to_string();
        assert!(matches!(
            validator.validate(&t, &DatasetId::from("ds")),
            Err(ReadinessError::Schema { .. })
        ));

        let mut t = table(vec![row("A")]);
        t.columns[3] = "Total_Beds".to_string();
        assert!(matches!(
            validator.validate(&t, &DatasetId::from("ds")),
            Err(ReadinessError::Schema { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_oversized_tables() {
        let validator = DefaultSchemaValidator::new();
        let err = validator
            .validate(&table(Vec::new()), &DatasetId::from("ds"))
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Size { rows: 0, .. }));

        let rows = (0..1200).map(|i| row(&format!("R{}", i))).collect();
        let err = validator
            .validate(&table(rows), &DatasetId::from("ds"))
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Size { rows: 1200, .. }));
    }

    #[test]
    fn test_rejects_ragged_row() {
        let validator = DefaultSchemaValidator::new();
        let mut short = row("B");
        short.pop();
        let err = validator
            .validate(&table(vec![row("A"), short]), &DatasetId::from("ds"))
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Schema { .. }));
    }

    #[test]
    fn test_rejects_duplicate_region() {
        let validator = DefaultSchemaValidator::new();
        let err = validator
            .validate(&table(vec![row("A"), row(" A ")]), &DatasetId::from("ds"))
            .unwrap_err();
        match err {
            ReadinessError::DuplicateKey { region, .. } => assert_eq!(region, "A"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_regions_are_not_duplicates() {
        let validator = DefaultSchemaValidator::new();
        let dataset = validator
            .validate(&table(vec![row(""), row("  ")]), &DatasetId::from("ds"))
            .unwrap();
        assert_eq!(dataset.rows.len(), 2);
    }
}
