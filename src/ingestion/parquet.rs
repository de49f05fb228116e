//! Parquet ingestion implementation.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

use crate::error::IngestionResult;
use crate::types::{Column, DataType, Table, Value};

/// Ingest a Parquet file into an in-memory [`Table`].
///
/// Notes:
/// - Columns are the top-level fields of the file schema, in schema order
/// - Uses the Parquet record API (`RowIter`)
/// - Integer, floating point, boolean, string, date and timestamp fields keep their type;
///   anything else (decimals, bytes, nested groups) is rendered as text
pub fn ingest_parquet_from_path(path: impl AsRef<Path>) -> IngestionResult<Table> {
    let reader = SerializedFileReader::try_from(path.as_ref())?;

    let names: Vec<String> = reader
        .metadata()
        .file_metadata()
        .schema_descr()
        .root_schema()
        .get_fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();

    let mut cells: Vec<Vec<Field>> = vec![Vec::new(); names.len()];
    for row_res in reader.into_iter() {
        let row = row_res?;
        for (column, (_, field)) in cells.iter_mut().zip(row.get_column_iter()) {
            column.push(field.clone());
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, column)| column_from_parquet(name, column))
        .collect();
    Ok(Table::new(columns)?)
}

fn column_from_parquet(name: String, cells: Vec<Field>) -> Column {
    let present = || cells.iter().filter(|f| !matches!(f, Field::Null));

    let data_type = if present().next().is_none() {
        DataType::Null
    } else if present().all(|f| as_i64(f).is_some()) {
        DataType::Int64
    } else if present().all(|f| as_f64(f).is_some()) {
        DataType::Float64
    } else if present().all(|f| matches!(f, Field::Bool(_))) {
        DataType::Bool
    } else if present().all(|f| as_timestamp(f).is_some()) {
        DataType::Timestamp
    } else {
        DataType::Utf8
    };

    let values = cells
        .iter()
        .map(|f| match (data_type, f) {
            (_, Field::Null) => Value::Null,
            (DataType::Int64, f) => as_i64(f).map_or(Value::Null, Value::Int64),
            (DataType::Float64, f) => as_f64(f).map_or(Value::Null, Value::Float64),
            (DataType::Bool, Field::Bool(b)) => Value::Bool(*b),
            (DataType::Timestamp, f) => as_timestamp(f).map_or(Value::Null, Value::Timestamp),
            (_, Field::Str(s)) => Value::Utf8(s.clone()),
            (_, other) => Value::Utf8(other.to_string()),
        })
        .collect();
    Column::new(name, data_type, values)
}

fn as_i64(f: &Field) -> Option<i64> {
    match f {
        Field::Byte(v) => Some(i64::from(*v)),
        Field::Short(v) => Some(i64::from(*v)),
        Field::Int(v) => Some(i64::from(*v)),
        Field::Long(v) => Some(*v),
        Field::UByte(v) => Some(i64::from(*v)),
        Field::UShort(v) => Some(i64::from(*v)),
        Field::UInt(v) => Some(i64::from(*v)),
        Field::ULong(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}

fn as_f64(f: &Field) -> Option<f64> {
    match f {
        Field::Float(v) => Some(f64::from(*v)),
        Field::Double(v) => Some(*v),
        other => as_i64(other).map(|v| v as f64),
    }
}

fn as_timestamp(f: &Field) -> Option<NaiveDateTime> {
    let utc = match f {
        Field::Date(days) => DateTime::from_timestamp(i64::from(*days) * 86_400, 0),
        Field::TimestampMillis(ms) => DateTime::from_timestamp_millis(*ms),
        Field::TimestampMicros(us) => DateTime::from_timestamp_micros(*us),
        _ => None,
    };
    utc.map(|dt| dt.naive_utc())
}
