//! Source adapters that turn already-fetched bytes into a [`crate::types::Table`].
//!
//! Fetching objects from storage is the caller's job; these adapters only parse. Most callers
//! should use [`ingest_from_path`] (from [`unified`]), which picks the format from the file
//! extension. Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - [`parquet`]
//!
//! [`batch::ingest_batch_from_dir`] reads every supported file under a directory into one table.
//!
//! Column types are inferred from the cells, the way a dataframe reader would: all-integer
//! columns become `Int64`, all-numeric `Float64`, all `true`/`false` `Bool`, anything else
//! `Utf8`. Empty cells, common NA tokens and JSON `null` become [`crate::types::Value::Null`].
//! Parquet columns keep their stored types.

pub mod batch;
mod columns;
pub mod csv;
pub mod json;
pub mod parquet;
pub mod unified;

pub use batch::{concat_tables, ingest_batch_from_dir};
pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions};
