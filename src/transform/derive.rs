//! Derived columns: processing timestamp, row hash and date partition keys.

use chrono::{Datelike, NaiveDateTime};
use rayon::prelude::*;
use sha2::{Digest as _, Sha256};

use crate::transform::dedup::canonical_f64_bits;
use crate::types::{Column, DataType, Table, Value};

pub const PROCESSED_AT_COLUMN: &str = "_processed_at";
pub const ROW_HASH_COLUMN: &str = "_row_hash";
pub const YEAR_COLUMN: &str = "_year";
pub const MONTH_COLUMN: &str = "_month";
pub const DAY_COLUMN: &str = "_day";

/// Append `_processed_at`, `_row_hash` and, when the table has a `Timestamp` column,
/// `_year`/`_month`/`_day` taken from the first one.
///
/// The row hash covers only the columns present on entry.
pub fn add_derived_fields(table: Table, processed_at: NaiveDateTime) -> Table {
    let rows = table.row_count();
    let hashes: Vec<Value> = (0..rows)
        .into_par_iter()
        .map(|row| Value::Int64(row_hash(table.columns(), row)))
        .collect();
    let partitions = table
        .columns()
        .iter()
        .find(|c| c.data_type == DataType::Timestamp)
        .map(partition_columns);

    let mut columns = table.into_columns();
    columns.push(Column::new(
        PROCESSED_AT_COLUMN,
        DataType::Timestamp,
        vec![Value::Timestamp(processed_at); rows],
    ));
    columns.push(Column::new(ROW_HASH_COLUMN, DataType::Int64, hashes));
    if let Some(partitions) = partitions {
        columns.extend(partitions);
    }
    Table::from_columns_unchecked(columns)
}

/// Stable 64-bit content hash of one row.
///
/// Each cell is fed to SHA-256 as a type tag followed by a fixed encoding of its payload, in
/// column order; the first 8 bytes of the digest are read big-endian. Identical cells in the
/// same order always give the same hash.
///
/// # Panics
///
/// Panics if `row` is out of bounds for any column.
pub fn row_hash(columns: &[Column], row: usize) -> i64 {
    let mut hasher = Sha256::new();
    for column in columns {
        update_with_cell(&mut hasher, &column.values[row]);
    }
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(prefix)
}

fn update_with_cell(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update([0u8]),
        Value::Int64(v) => {
            hasher.update([1u8]);
            hasher.update(v.to_be_bytes());
        }
        Value::Float64(v) => {
            hasher.update([2u8]);
            hasher.update(canonical_f64_bits(*v).to_be_bytes());
        }
        Value::Bool(v) => {
            hasher.update([3u8]);
            hasher.update([u8::from(*v)]);
        }
        Value::Utf8(s) => {
            hasher.update([4u8]);
            hasher.update((s.len() as u64).to_be_bytes());
            hasher.update(s.as_bytes());
        }
        Value::Timestamp(ts) => {
            let utc = ts.and_utc();
            hasher.update([5u8]);
            hasher.update(utc.timestamp().to_be_bytes());
            hasher.update(utc.timestamp_subsec_nanos().to_be_bytes());
        }
    }
}

fn partition_columns(source: &Column) -> [Column; 3] {
    let part = |f: fn(&NaiveDateTime) -> i64| -> Vec<Value> {
        source
            .values
            .iter()
            .map(|v| v.as_timestamp().map_or(Value::Null, |ts| Value::Int64(f(&ts))))
            .collect()
    };
    [
        Column::new(YEAR_COLUMN, DataType::Int64, part(|ts| i64::from(ts.year()))),
        Column::new(MONTH_COLUMN, DataType::Int64, part(|ts| i64::from(ts.month()))),
        Column::new(DAY_COLUMN, DataType::Int64, part(|ts| i64::from(ts.day()))),
    ]
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{add_derived_fields, row_hash};
    use crate::types::{Column, DataType, Table, Value};

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32) -> Value {
        Value::Timestamp(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
    }

    #[test]
    fn appends_processed_at_and_hash_without_partitions() {
        let t = Table::new(vec![Column::new("id", DataType::Int64, vec![Value::Int64(1), Value::Int64(2)])]).unwrap();
        let out = add_derived_fields(t, run_at());
        assert_eq!(
            out.column_names().collect::<Vec<_>>(),
            vec!["id", "_processed_at", "_row_hash"]
        );
        assert_eq!(
            out.column("_processed_at").unwrap().values,
            vec![Value::Timestamp(run_at()), Value::Timestamp(run_at())]
        );
        let hashes = &out.column("_row_hash").unwrap().values;
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn partitions_come_from_first_timestamp_column() {
        let t = Table::new(vec![
            Column::new("shipped_at", DataType::Timestamp, vec![ts(2024, 3, 9), Value::Null]),
            Column::new("order_date", DataType::Timestamp, vec![ts(2023, 1, 2), ts(2023, 1, 3)]),
        ])
        .unwrap();
        let out = add_derived_fields(t, run_at());
        assert_eq!(
            out.column_names().collect::<Vec<_>>(),
            vec!["shipped_at", "order_date", "_processed_at", "_row_hash", "_year", "_month", "_day"]
        );
        assert_eq!(out.column("_year").unwrap().values, vec![Value::Int64(2024), Value::Null]);
        assert_eq!(out.column("_month").unwrap().values, vec![Value::Int64(3), Value::Null]);
        assert_eq!(out.column("_day").unwrap().values, vec![Value::Int64(9), Value::Null]);
    }

    #[test]
    fn row_hash_is_deterministic_and_order_sensitive() {
        let a = Column::new("a", DataType::Utf8, vec!["x".into()]);
        let b = Column::new("b", DataType::Utf8, vec!["y".into()]);
        let ab = vec![a.clone(), b.clone()];
        let ba = vec![b, a];
        assert_eq!(row_hash(&ab, 0), row_hash(&ab, 0));
        assert_ne!(row_hash(&ab, 0), row_hash(&ba, 0));
    }

    #[test]
    fn row_hash_distinguishes_types_and_boundaries() {
        let text = vec![Column::new("a", DataType::Utf8, vec!["1".into()])];
        let int = vec![Column::new("a", DataType::Int64, vec![Value::Int64(1)])];
        assert_ne!(row_hash(&text, 0), row_hash(&int, 0));

        let split_1 = vec![
            Column::new("a", DataType::Utf8, vec!["ab".into()]),
            Column::new("b", DataType::Utf8, vec!["c".into()]),
        ];
        let split_2 = vec![
            Column::new("a", DataType::Utf8, vec!["a".into()]),
            Column::new("b", DataType::Utf8, vec!["bc".into()]),
        ];
        assert_ne!(row_hash(&split_1, 0), row_hash(&split_2, 0));
    }

    #[test]
    fn hash_ignores_processing_time() {
        let t = Table::new(vec![Column::new("id", DataType::Int64, vec![Value::Int64(7)])]).unwrap();
        let later = run_at() + chrono::Duration::hours(5);
        let first = add_derived_fields(t.clone(), run_at());
        let second = add_derived_fields(t, later);
        assert_eq!(first.column("_row_hash"), second.column("_row_hash"));
    }
}
