//! Column type inference shared by the ingestion adapters.

use crate::types::{Column, DataType, Value};

/// Cell spellings read as missing values.
pub(crate) const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A",
];

pub(crate) fn is_na(raw: &str) -> bool {
    NA_TOKENS.contains(&raw.trim())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Build a typed column from text cells (`None` = missing).
///
/// Cells keep their original text when the column stays `Utf8`.
pub(crate) fn column_from_text(name: String, cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten().map(|s| s.trim());

    if present().next().is_none() {
        return Column::new(name, DataType::Null, vec![Value::Null; cells.len()]);
    }

    if present().all(|s| s.parse::<i64>().is_ok()) {
        let values = cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|s| s.trim().parse::<i64>().ok())
                    .map_or(Value::Null, Value::Int64)
            })
            .collect();
        return Column::new(name, DataType::Int64, values);
    }

    if present().all(|s| s.parse::<f64>().is_ok()) {
        let values = cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|s| s.trim().parse::<f64>().ok())
                    .map_or(Value::Null, Value::Float64)
            })
            .collect();
        return Column::new(name, DataType::Float64, values);
    }

    if present().all(|s| parse_bool(s).is_some()) {
        let values = cells
            .iter()
            .map(|c| {
                c.as_deref()
                    .and_then(|s| parse_bool(s.trim()))
                    .map_or(Value::Null, Value::Bool)
            })
            .collect();
        return Column::new(name, DataType::Bool, values);
    }

    let values = cells.into_iter().map(Value::from).collect();
    Column::new(name, DataType::Utf8, values)
}

/// Build a typed column from JSON cells.
///
/// Uniform integers, numbers or booleans keep their type; strings and mixed columns become
/// `Utf8`, with non-string cells rendered as JSON text.
pub(crate) fn column_from_json(name: String, cells: Vec<serde_json::Value>) -> Column {
    use serde_json::Value as Json;

    let present = || cells.iter().filter(|c| !c.is_null());

    let data_type = if present().next().is_none() {
        DataType::Null
    } else if present().all(|c| c.is_i64()) {
        DataType::Int64
    } else if present().all(Json::is_number) {
        DataType::Float64
    } else if present().all(Json::is_boolean) {
        DataType::Bool
    } else {
        DataType::Utf8
    };

    let values = cells
        .into_iter()
        .map(|c| match (data_type, c) {
            (_, Json::Null) => Value::Null,
            (DataType::Int64, c) => c.as_i64().map_or(Value::Null, Value::Int64),
            (DataType::Float64, c) => c.as_f64().map_or(Value::Null, Value::Float64),
            (DataType::Bool, c) => c.as_bool().map_or(Value::Null, Value::Bool),
            (_, Json::String(s)) => Value::Utf8(s),
            (_, other) => Value::Utf8(other.to_string()),
        })
        .collect();
    Column::new(name, data_type, values)
}
