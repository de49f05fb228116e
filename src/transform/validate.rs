//! Read-only quality checks over the final table.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::transform::stats::ValidationReport;
use crate::types::{Column, DataType, Table};

/// A text column is flagged as a likely identifier above this distinct/rows ratio.
pub const CARDINALITY_RATIO_THRESHOLD: f64 = 0.9;

/// The cardinality check only runs on tables with more rows than this.
pub const CARDINALITY_MIN_ROWS: usize = 100;

/// Inspect `table` and report residual nulls and high-cardinality text columns.
///
/// Warnings are ordered: one per column with nulls (column order), then one per
/// high-cardinality `Utf8` column (column order). An empty table yields a valid report with
/// zero rows.
pub fn validate(table: &Table) -> ValidationReport {
    let row_count = table.row_count();
    let mut warnings = Vec::new();

    let null_counts: Vec<usize> = table.columns().par_iter().map(Column::null_count).collect();
    for (column, &nulls) in table.columns().iter().zip(&null_counts) {
        if nulls > 0 {
            warnings.push(format!(
                "Column '{}' contains {} null value(s)",
                column.name, nulls
            ));
        }
    }

    if row_count > CARDINALITY_MIN_ROWS {
        let ratios: Vec<Option<f64>> = table
            .columns()
            .par_iter()
            .map(|c| {
                (c.data_type == DataType::Utf8)
                    .then(|| distinct_non_null(c) as f64 / row_count as f64)
            })
            .collect();
        for (column, ratio) in table.columns().iter().zip(ratios) {
            if let Some(ratio) = ratio.filter(|r| *r > CARDINALITY_RATIO_THRESHOLD) {
                warnings.push(format!(
                    "Column '{}' may be a unique identifier (high cardinality, ratio {:.2})",
                    column.name, ratio
                ));
            }
        }
    }

    ValidationReport {
        is_valid: warnings.is_empty(),
        row_count,
        column_count: table.column_count(),
        schema: table.schema(),
        warnings,
    }
}

fn distinct_non_null(column: &Column) -> usize {
    column
        .values
        .iter()
        .filter_map(|v| v.as_str())
        .collect::<HashSet<&str>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::validate;
    use crate::types::{Column, DataType, Table, Value};

    fn text_column(name: &str, n: usize, distinct: usize) -> Column {
        Column::new(
            name,
            DataType::Utf8,
            (0..n).map(|i| Value::Utf8(format!("v{}", i % distinct))).collect(),
        )
    }

    #[test]
    fn clean_table_is_valid() {
        let t = Table::new(vec![
            Column::new("id", DataType::Int64, vec![Value::Int64(1), Value::Int64(2)]),
            text_column("name", 2, 2),
        ])
        .unwrap();
        let report = validate(&t);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty());
        assert_eq!(report.row_count, 2);
        assert_eq!(report.column_count, 2);
        assert_eq!(report.schema.data_type_of("id"), Some(DataType::Int64));
    }

    #[test]
    fn one_warning_per_column_with_nulls() {
        let t = Table::new(vec![
            Column::new("a", DataType::Int64, vec![Value::Null, Value::Int64(1)]),
            Column::new("b", DataType::Int64, vec![Value::Int64(1), Value::Int64(1)]),
            Column::new("c", DataType::Bool, vec![Value::Null, Value::Null]),
        ])
        .unwrap();
        let report = validate(&t);
        assert!(!report.is_valid);
        assert_eq!(
            report.warnings,
            vec![
                "Column 'a' contains 1 null value(s)".to_string(),
                "Column 'c' contains 2 null value(s)".to_string(),
            ]
        );
    }

    #[test]
    fn high_cardinality_only_checked_above_min_rows() {
        let small = Table::new(vec![text_column("email", 100, 100)]).unwrap();
        assert!(validate(&small).is_valid);

        let large = Table::new(vec![
            text_column("email", 101, 101),
            text_column("country", 101, 5),
        ])
        .unwrap();
        let report = validate(&large);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Column 'email' may be a unique identifier"));
    }

    #[test]
    fn non_text_columns_skip_cardinality_check() {
        let ids = Column::new("id", DataType::Int64, (0..200).map(Value::Int64).collect());
        let report = validate(&Table::new(vec![ids]).unwrap());
        assert!(report.is_valid);
    }

    #[test]
    fn empty_table_gives_empty_report() {
        let report = validate(&Table::default());
        assert!(report.is_valid);
        assert_eq!(report.row_count, 0);
        assert_eq!(report.column_count, 0);
        assert!(report.schema.is_empty());
    }
}
