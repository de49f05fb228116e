//! Exact-duplicate row removal.

use std::collections::HashSet;

use chrono::NaiveDateTime;

use crate::transform::stats::DeduplicationStats;
use crate::types::{Table, Value};

/// Hashable view of a cell. Floats compare by canonical bit pattern so that `-0.0 == 0.0`
/// and all NaNs are equal, matching how a dataframe treats duplicate rows.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(&'a str),
    Timestamp(NaiveDateTime),
}

impl<'a> From<&'a Value> for CellKey<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => CellKey::Null,
            Value::Int64(v) => CellKey::Int64(*v),
            Value::Float64(v) => CellKey::Float64(canonical_f64_bits(*v)),
            Value::Bool(v) => CellKey::Bool(*v),
            Value::Utf8(s) => CellKey::Utf8(s.as_str()),
            Value::Timestamp(ts) => CellKey::Timestamp(*ts),
        }
    }
}

/// Bit pattern of `v` with `-0.0` folded into `0.0` and every NaN folded into one.
pub(crate) fn canonical_f64_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

/// Remove rows that equal an earlier row in every column (null equals null).
///
/// The first occurrence is kept and row order is preserved.
pub fn deduplicate(table: Table) -> (Table, DeduplicationStats) {
    let rows_before = table.row_count();
    let keep = first_occurrences(&table);
    let table = if keep.iter().all(|k| *k) {
        table
    } else {
        table.retain_rows(&keep)
    };
    let rows_after = table.row_count();

    (
        table,
        DeduplicationStats {
            rows_before,
            rows_after,
            duplicates_removed: rows_before - rows_after,
        },
    )
}

fn first_occurrences(table: &Table) -> Vec<bool> {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(table.row_count());
    (0..table.row_count())
        .map(|row| {
            let key: Vec<CellKey<'_>> = table
                .columns()
                .iter()
                .map(|c| CellKey::from(&c.values[row]))
                .collect();
            seen.insert(key)
        })
        .collect()
}
