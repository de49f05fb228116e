//! `tabular-transform` is an in-memory transformation engine for tabular records.
//!
//! It takes a [`types::Table`] (ingested from CSV/JSON/Parquet or built in code), runs it through a
//! fixed pipeline and returns the transformed table together with a structured
//! [`transform::TransformStats`] describing what every stage did.
//!
//! ## Pipeline
//!
//! 1. **Column names** are normalized (`"Unit Price ($)"` becomes `unit_price`).
//! 2. **Nulls** are dropped, filled or flagged per [`config::NullHandling`].
//! 3. **Duplicate rows** are removed, keeping the first occurrence.
//! 4. **Types** are inferred for text columns: date-like names become timestamps, mostly
//!    numeric columns become `Int64`/`Float64`.
//! 5. **Derived fields** are appended: `_processed_at`, `_row_hash` and, when a timestamp
//!    column exists, `_year`/`_month`/`_day`.
//! 6. **Validation** reports residual nulls and likely identifier columns.
//!
//! An input with zero rows is returned unchanged with an `empty_input` status.
//!
//! ## Quick example
//!
//! ```no_run
//! use tabular_transform::ingestion::{ingest_from_path, IngestionOptions};
//! use tabular_transform::{NullHandling, TransformConfig, Transformer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = ingest_from_path("orders.csv", &IngestionOptions::default())?;
//!
//! let config = TransformConfig::default().with_null_handling(NullHandling::Fill);
//! let transformer = Transformer::new(config)?;
//! let (out, stats) = transformer.transform(table);
//!
//! println!("rows={} valid={}", out.row_count(), stats.is_valid());
//! println!("{}", serde_json::to_string_pretty(&stats)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`config::TransformConfig`] can be built in code, loaded from JSON (either bare or nested
//! under `etl.transform`) and overridden from `ETL_TRANSFORM_*` environment variables.
//! It is validated once, when the [`transform::Transformer`] is created.
//!
//! ## Modules
//!
//! - [`types`]: columnar table, schema and cell value types
//! - [`transform`]: the pipeline, its individual stages and the statistics they report
//! - [`config`]: transformation settings
//! - [`ingestion`]: CSV/JSON/Parquet readers with type inference, directory batches
//! - [`execution`]: thread pool setup and pipeline observers
//! - [`error`]: error types

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod transform;
pub mod types;

pub use config::{NullHandling, TransformConfig};
pub use error::{ConfigError, ConfigResult, IngestionError, IngestionResult, TableError, TableResult};
pub use transform::{TransformStats, Transformer};
