//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a file into an in-memory
//! [`crate::types::Table`]. If [`IngestionOptions::format`] is `None`, the format is inferred
//! from the file extension.

use std::path::Path;

use tracing::{info, warn};

use crate::error::{IngestionError, IngestionResult};
use crate::types::Table;

use super::{csv, json, parquet};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values with a header row.
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
    /// Apache Parquet.
    Parquet,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "jsonl" | "ndjson" => Some(Self::Json),
            "parquet" | "pq" => Some(Self::Parquet),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, Default)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
}

/// Unified ingestion entry point for path-based sources.
///
/// ```no_run
/// use tabular_transform::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), tabular_transform::IngestionError> {
/// // Uses `.csv` to select CSV ingestion.
/// let table = ingest_from_path("orders.csv", &IngestionOptions::default())?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> IngestionResult<Table> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Json => json::ingest_json_from_path(path),
        IngestionFormat::Parquet => parquet::ingest_parquet_from_path(path),
    };

    match &result {
        Ok(table) => info!(
            format = ?fmt,
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "ingested"
        ),
        Err(e) => warn!(format = ?fmt, path = %path.display(), error = %e, "ingestion failed"),
    }

    result
}

fn infer_format_from_path(path: &Path) -> IngestionResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::UnsupportedFormat {
            message: format!("cannot infer format: path has no extension ({})", path.display()),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| IngestionError::UnsupportedFormat {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
