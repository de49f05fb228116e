//! Type inference and casting for text columns.
//!
//! Dispatch is by column name first: a `Utf8` column whose name mentions a date-like keyword
//! is parsed as timestamps and nothing else. Every other `Utf8` column is offered numeric
//! conversion, which sticks only when more than 80% of the rows parse.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;

use crate::transform::stats::TypeCastStats;
use crate::types::{Column, DataType, Table, Value};

/// Substrings (matched case-insensitively) that mark a column as temporal.
pub const DATE_KEYWORDS: [&str; 4] = ["date", "time", "created", "updated"];

/// A column becomes numeric only if parsed non-null cells exceed this fraction of all rows.
pub const NUMERIC_RATIO_THRESHOLD: f64 = 0.8;

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"];

/// Returns `true` if `name` contains one of [`DATE_KEYWORDS`].
pub fn is_date_like(name: &str) -> bool {
    let lower = name.to_lowercase();
    DATE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Parse a timestamp, trying `date_format` first, then RFC 3339, then built-in layouts.
///
/// Date-only inputs resolve to midnight. Offsets in RFC 3339 input are converted to UTC.
pub fn parse_timestamp(raw: &str, date_format: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_with_format(s, date_format)
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        })
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_with_format(s: &str, fmt: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, fmt).ok().or_else(|| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

/// Parse a cell as a number. NaN is treated as missing.
fn parse_number(raw: &str) -> Option<Number> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| !f.is_nan())
        .map(Number::Float)
}

struct CastOutcome {
    to: DataType,
    coerced_to_null: usize,
}

/// Infer and cast the type of every `Utf8` column.
///
/// Parse failures never abort the stage; the affected cell becomes null and is counted in
/// [`TypeCastStats::coerced_to_null`].
pub fn cast_types(table: Table, date_format: &str) -> (Table, TypeCastStats) {
    let row_count = table.row_count();
    let results: Vec<(Column, Option<CastOutcome>)> = table
        .into_columns()
        .into_par_iter()
        .map(|column| cast_column(column, row_count, date_format))
        .collect();

    let mut stats = TypeCastStats::default();
    let mut columns = Vec::with_capacity(results.len());
    for (column, outcome) in results {
        if let Some(outcome) = outcome {
            stats.converted.insert(column.name.clone(), outcome.to);
            stats
                .coerced_to_null
                .insert(column.name.clone(), outcome.coerced_to_null);
        }
        columns.push(column);
    }
    (Table::from_columns_unchecked(columns), stats)
}

fn cast_column(column: Column, row_count: usize, date_format: &str) -> (Column, Option<CastOutcome>) {
    if column.data_type != DataType::Utf8 {
        return (column, None);
    }
    if is_date_like(&column.name) {
        let (column, outcome) = cast_to_timestamp(column, date_format);
        return (column, Some(outcome));
    }
    cast_to_numeric(column, row_count)
}

fn cast_to_timestamp(column: Column, date_format: &str) -> (Column, CastOutcome) {
    let mut coerced_to_null = 0;
    let mut values = Vec::with_capacity(column.values.len());
    for value in column.values {
        values.push(match value {
            Value::Utf8(s) => match parse_timestamp(&s, date_format) {
                Some(ts) => Value::Timestamp(ts),
                None => {
                    coerced_to_null += 1;
                    Value::Null
                }
            },
            _ => Value::Null,
        });
    }
    (
        Column::new(column.name, DataType::Timestamp, values),
        CastOutcome {
            to: DataType::Timestamp,
            coerced_to_null,
        },
    )
}

fn cast_to_numeric(column: Column, row_count: usize) -> (Column, Option<CastOutcome>) {
    let parsed: Vec<Option<Number>> = column
        .values
        .iter()
        .map(|v| v.as_str().and_then(parse_number))
        .collect();
    let parsed_count = parsed.iter().filter(|p| p.is_some()).count();
    if row_count == 0 || (parsed_count as f64 / row_count as f64) <= NUMERIC_RATIO_THRESHOLD {
        return (column, None);
    }

    let source_count = column.values.iter().filter(|v| !v.is_null()).count();
    let all_integral = parsed.iter().flatten().all(|n| matches!(n, Number::Int(_)));
    let (data_type, values) = if all_integral {
        let values = parsed
            .into_iter()
            .map(|p| match p {
                Some(Number::Int(i)) => Value::Int64(i),
                _ => Value::Null,
            })
            .collect();
        (DataType::Int64, values)
    } else {
        let values = parsed
            .into_iter()
            .map(|p| match p {
                Some(Number::Int(i)) => Value::Float64(i as f64),
                Some(Number::Float(f)) => Value::Float64(f),
                None => Value::Null,
            })
            .collect();
        (DataType::Float64, values)
    };

    (
        Column::new(column.name, data_type, values),
        Some(CastOutcome {
            to: data_type,
            coerced_to_null: source_count - parsed_count,
        }),
    )
}
