//! JSON ingestion implementation.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - Newline-delimited JSON (NDJSON / JSON Lines): `{"a":1}\n{"a":2}\n`
//!
//! Columns appear in the order their keys are first seen. A key missing from a record is a
//! null cell for that record.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value as Json};

use crate::error::{IngestionError, IngestionResult};
use crate::types::Table;

use super::columns::column_from_json;

/// Ingest a JSON file into an in-memory [`Table`].
pub fn ingest_json_from_path(path: impl AsRef<Path>) -> IngestionResult<Table> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text)
}

/// Ingest JSON from an in-memory string into a [`Table`].
///
/// Blank input yields an empty table.
pub fn ingest_json_from_str(input: &str) -> IngestionResult<Table> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Table::default());
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<Json>(trimmed) {
        return match v {
            Json::Array(items) => table_from_records(items),
            Json::Object(_) => table_from_records(vec![v]),
            _ => Err(IngestionError::Malformed {
                record: 1,
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        };
    }

    // Fall back to NDJSON.
    let mut records = Vec::new();
    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<Json>(line)?);
    }
    table_from_records(records)
}

fn table_from_records(records: Vec<Json>) -> IngestionResult<Table> {
    let objects: Vec<Map<String, Json>> = records
        .into_iter()
        .enumerate()
        .map(|(idx, record)| match record {
            Json::Object(map) => Ok(map),
            _ => Err(IngestionError::Malformed {
                record: idx + 1,
                message: "record is not a json object".to_string(),
            }),
        })
        .collect::<IngestionResult<_>>()?;

    let mut names: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let mut cells: Vec<Vec<Json>> = vec![Vec::with_capacity(objects.len()); names.len()];
    for mut object in objects {
        for (name, column) in names.iter().zip(cells.iter_mut()) {
            column.push(object.remove(name).unwrap_or(Json::Null));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, column)| column_from_json(name, column))
        .collect();
    Ok(Table::new(columns)?)
}
