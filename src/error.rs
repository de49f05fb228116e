use thiserror::Error;

use crate::types::DataType;

/// Convenience result type for [`crate::types::Table`] construction.
pub type TableResult<T> = Result<T, TableError>;

/// Convenience result type for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// A table could not be built because its columns or rows are not aligned, or a cell does not
/// match its column type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// A column's length differs from the table's row count.
    #[error("column '{column}' has {actual} values, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// A non-null cell's type differs from its column's declared type.
    #[error("column '{column}' is {expected} but row {row} holds a {actual} value")]
    CellTypeMismatch {
        column: String,
        row: usize,
        expected: DataType,
        actual: DataType,
    },

    /// A row-major row does not have one value per schema field.
    #[error("row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Error returned while loading or validating a [`crate::config::TransformConfig`].
///
/// Configuration errors are fatal: a transformer is never built from a config that fails here.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The null-handling policy is not one of `drop`, `fill`, `flag`.
    #[error("unsupported null handling policy '{value}' (expected drop, fill or flag)")]
    UnsupportedNullHandling { value: String },

    /// The date format hint is not a valid strftime pattern.
    #[error("invalid date format '{format}'")]
    InvalidDateFormat { format: String },

    /// `num_threads` was set to zero or to a non-integer.
    #[error("invalid thread count '{value}' (expected a positive integer)")]
    InvalidThreads { value: String },

    /// The configuration document is not valid JSON or does not match the expected shape.
    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An environment variable override is not valid unicode.
    #[error("environment variable '{key}' is not valid unicode")]
    Env { key: String },

    /// The worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across CSV and JSON ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON ingestion error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parquet ingestion error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The ingested columns could not be assembled into a table.
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// The input's format could not be determined or is not supported.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The input parsed but does not have a tabular shape.
    #[error("malformed input at record {record}: {message}")]
    Malformed { record: usize, message: String },
}
