//! Null handling policies.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;

use crate::config::NullHandling;
use crate::transform::normalize::unique_name;
use crate::transform::stats::NullHandlingStats;
use crate::types::{Column, DataType, Table, Value};

/// Suffix of the indicator columns appended by [`NullHandling::Flag`].
pub const NULL_FLAG_SUFFIX: &str = "_is_null";

/// Apply `policy` to the nulls in `table`.
///
/// Null counts are taken before any value changes:
///
/// - `Drop`: rows with at least one null are removed; survivors keep their order.
/// - `Fill`: `Int64`/`Float64` nulls become `0`, `Utf8` nulls become `""`. A column with no
///   type information (all null) becomes a `Utf8` column of `""`. `Bool` and `Timestamp`
///   columns have no empty value and keep their nulls.
/// - `Flag`: for every column containing nulls, a `Bool` column `<column>_is_null` is appended
///   after the existing columns. Original values are left as they are.
pub fn handle_nulls(table: Table, policy: NullHandling) -> (Table, NullHandlingStats) {
    let counts: Vec<usize> = table.columns().par_iter().map(Column::null_count).collect();

    let mut null_counts_before = BTreeMap::new();
    for (column, &count) in table.columns().iter().zip(&counts) {
        *null_counts_before.entry(column.name.clone()).or_insert(0) += count;
    }
    let total_nulls_found = counts.iter().sum();

    let mut stats = NullHandlingStats {
        method: policy,
        null_counts_before,
        total_nulls_found,
        rows_dropped: 0,
        cells_filled: 0,
        flag_columns: Vec::new(),
    };

    let table = match policy {
        NullHandling::Drop => {
            if total_nulls_found == 0 {
                table
            } else {
                let before = table.row_count();
                let keep = null_free_rows(&table);
                let out = table.retain_rows(&keep);
                stats.rows_dropped = before - out.row_count();
                out
            }
        }
        NullHandling::Fill => {
            let filled: Vec<(Column, usize)> = table
                .into_columns()
                .into_par_iter()
                .map(fill_column)
                .collect();
            stats.cells_filled = filled.iter().map(|(_, n)| n).sum();
            Table::from_columns_unchecked(filled.into_iter().map(|(c, _)| c).collect())
        }
        NullHandling::Flag => {
            let mut taken: HashSet<String> = table.column_names().map(str::to_string).collect();
            let flags: Vec<Column> = table
                .columns()
                .iter()
                .zip(&counts)
                .filter(|(_, count)| **count > 0)
                .map(|(column, _)| {
                    let name = unique_name(&format!("{}{NULL_FLAG_SUFFIX}", column.name), &taken);
                    taken.insert(name.clone());
                    let values = column.values.iter().map(|v| Value::Bool(v.is_null())).collect();
                    Column::new(name, DataType::Bool, values)
                })
                .collect();
            stats.flag_columns = flags.iter().map(|c| c.name.clone()).collect();
            let mut columns = table.into_columns();
            columns.extend(flags);
            Table::from_columns_unchecked(columns)
        }
    };

    (table, stats)
}

fn null_free_rows(table: &Table) -> Vec<bool> {
    (0..table.row_count())
        .into_par_iter()
        .map(|row| table.columns().iter().all(|c| !c.values[row].is_null()))
        .collect()
}

fn fill_column(mut column: Column) -> (Column, usize) {
    let replacement = match column.data_type {
        DataType::Int64 => Value::Int64(0),
        DataType::Float64 => Value::Float64(0.0),
        DataType::Utf8 => Value::Utf8(String::new()),
        DataType::Null => {
            column.data_type = DataType::Utf8;
            Value::Utf8(String::new())
        }
        DataType::Bool | DataType::Timestamp => return (column, 0),
    };

    let mut filled = 0;
    for value in column.values.iter_mut().filter(|v| v.is_null()) {
        *value = replacement.clone();
        filled += 1;
    }
    (column, filled)
}
