//! Multi-file ingestion: every supported file under a directory, combined into one table.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::IngestionResult;
use crate::types::{Column, DataType, Table, Value};

use super::unified::{ingest_from_path, IngestionFormat, IngestionOptions};

/// Ingest every supported file under `dir` (recursively, in file-name order) and stack the
/// results into one [`Table`].
///
/// - Files whose extension is not a known format are skipped, unless
///   [`IngestionOptions::format`] forces one.
/// - A file that fails to ingest is logged and skipped; the others are still combined.
/// - No readable file yields an empty table.
///
/// See [`concat_tables`] for how differing columns are combined.
pub fn ingest_batch_from_dir(dir: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Table> {
    let dir = dir.as_ref();
    info!(dir = %dir.display(), "batch ingestion started");

    let mut tables = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(IngestionFormat::from_extension)
            .is_some();
        if options.format.is_none() && !known {
            debug!(path = %path.display(), "skipping file with unsupported extension");
            continue;
        }
        match ingest_from_path(path, options) {
            Ok(table) => tables.push(table),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping file that failed to ingest"),
        }
    }

    if tables.is_empty() {
        warn!(dir = %dir.display(), "no files ingested");
        return Ok(Table::default());
    }

    let files = tables.len();
    let combined = concat_tables(tables)?;
    info!(files, rows = combined.row_count(), columns = combined.column_count(), "batch ingestion complete");
    Ok(combined)
}

/// Stack tables vertically.
///
/// Columns are the union of all input columns in first-seen order (repeated names within one
/// table are matched by occurrence). A column absent from a table is null for that table's rows.
/// Column types are unified: `Null` adopts the other type, `Int64` with `Float64` widens to
/// `Float64`, and any other disagreement becomes `Utf8` with values rendered as text.
pub fn concat_tables(tables: Vec<Table>) -> IngestionResult<Table> {
    let mut keys: Vec<(String, usize)> = Vec::new();
    let mut types: HashMap<(String, usize), DataType> = HashMap::new();
    let keyed: Vec<(usize, HashMap<(String, usize), Column>)> = tables
        .into_iter()
        .map(|table| {
            let rows = table.row_count();
            let mut occurrences: HashMap<String, usize> = HashMap::new();
            let mut columns = HashMap::new();
            for column in table.into_columns() {
                let n = occurrences.entry(column.name.clone()).or_insert(0);
                let key = (column.name.clone(), *n);
                *n += 1;
                match types.get_mut(&key) {
                    Some(existing) => *existing = unify(*existing, column.data_type),
                    None => {
                        keys.push(key.clone());
                        types.insert(key.clone(), column.data_type);
                    }
                }
                columns.insert(key, column);
            }
            (rows, columns)
        })
        .collect();

    let total_rows: usize = keyed.iter().map(|(rows, _)| rows).sum();
    let mut out: Vec<Column> = keys
        .iter()
        .map(|key| {
            let data_type = types.get(key).copied().unwrap_or(DataType::Null);
            Column::new(key.0.clone(), data_type, Vec::with_capacity(total_rows))
        })
        .collect();

    for (rows, mut columns) in keyed {
        for (target, key) in out.iter_mut().zip(&keys) {
            match columns.remove(key) {
                Some(source) => {
                    let to = target.data_type;
                    target.values.extend(source.values.into_iter().map(|v| convert(v, to)));
                }
                None => target.values.extend(std::iter::repeat_n(Value::Null, rows)),
            }
        }
    }

    Ok(Table::new(out)?)
}

fn unify(a: DataType, b: DataType) -> DataType {
    match (a, b) {
        (a, b) if a == b => a,
        (DataType::Null, other) | (other, DataType::Null) => other,
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

fn convert(value: Value, to: DataType) -> Value {
    match (value, to) {
        (Value::Null, _) => Value::Null,
        (Value::Int64(v), DataType::Float64) => Value::Float64(v as f64),
        (v, DataType::Utf8) => Value::Utf8(render(v)),
        (v, _) => v,
    }
}

fn render(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Utf8(s) => s,
        Value::Timestamp(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::concat_tables;
    use crate::types::{Column, DataType, Table, Value};

    #[test]
    fn stacks_on_column_union() {
        let a = Table::new(vec![
            Column::new("id", DataType::Int64, vec![Value::Int64(1)]),
            Column::new("region", DataType::Utf8, vec!["north".into()]),
        ])
        .unwrap();
        let b = Table::new(vec![
            Column::new("id", DataType::Int64, vec![Value::Int64(2), Value::Int64(3)]),
            Column::new("channel", DataType::Utf8, vec!["web".into(), "store".into()]),
        ])
        .unwrap();

        let t = concat_tables(vec![a, b]).unwrap();
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["id", "region", "channel"]);
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.column("region").unwrap().values, vec![Value::from("north"), Value::Null, Value::Null]);
        assert_eq!(t.column("channel").unwrap().values, vec![Value::Null, Value::from("web"), Value::from("store")]);
    }

    #[test]
    fn unifies_column_types() {
        let a = Table::new(vec![
            Column::new("n", DataType::Int64, vec![Value::Int64(1)]),
            Column::new("x", DataType::Bool, vec![Value::Bool(true)]),
            Column::new("e", DataType::Null, vec![Value::Null]),
        ])
        .unwrap();
        let b = Table::new(vec![
            Column::new("n", DataType::Float64, vec![Value::Float64(2.5)]),
            Column::new("x", DataType::Utf8, vec!["maybe".into()]),
            Column::new("e", DataType::Int64, vec![Value::Int64(7)]),
        ])
        .unwrap();

        let t = concat_tables(vec![a, b]).unwrap();
        assert_eq!(t.column("n").unwrap().values, vec![Value::Float64(1.0), Value::Float64(2.5)]);
        assert_eq!(t.column("x").unwrap().data_type, DataType::Utf8);
        assert_eq!(t.column("x").unwrap().values, vec![Value::from("true"), Value::from("maybe")]);
        assert_eq!(t.column("e").unwrap().data_type, DataType::Int64);
        assert_eq!(t.column("e").unwrap().values, vec![Value::Null, Value::Int64(7)]);
    }

    #[test]
    fn no_tables_is_empty() {
        assert!(concat_tables(vec![]).unwrap().is_empty());
    }
}
