//! The transform pipeline.
//!
//! A [`Transformer`] runs a fixed sequence of stages over one [`Table`]:
//!
//! 1. [`normalize_columns`]: canonical column names
//! 2. [`handle_nulls`]: the configured [`NullHandling`] policy
//! 3. [`deduplicate`]: exact-duplicate rows, compared on raw (un-cast) values
//! 4. [`cast_types`]: timestamp/numeric inference for text columns
//! 5. [`add_derived_fields`]: `_processed_at`, `_row_hash`, `_year`/`_month`/`_day`
//! 6. [`validate`]: read-only quality report
//!
//! Every stage consumes the previous table and returns a new one. Statistics are collected into
//! a [`TransformStats`], one sub-record per stage.
//!
//! ## Example
//!
//! ```rust
//! use tabular_transform::config::TransformConfig;
//! use tabular_transform::transform::Transformer;
//! use tabular_transform::types::{DataType, Field, Schema, Table, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("Order ID", DataType::Utf8),
//!     Field::new("Order Date", DataType::Utf8),
//!     Field::new("Amount", DataType::Utf8),
//! ]);
//! let table = Table::from_rows(
//!     schema,
//!     vec![
//!         vec!["A1".into(), "2024-01-15".into(), "10.5".into()],
//!         vec!["A2".into(), "2024-01-16".into(), "20".into()],
//!         vec!["A2".into(), "2024-01-16".into(), "20".into()],
//!     ],
//! )
//! .unwrap();
//!
//! let transformer = Transformer::new(TransformConfig::default()).unwrap();
//! let (out, stats) = transformer.transform(table);
//!
//! assert_eq!(out.row_count(), 2);
//! assert_eq!(stats.deduplication.unwrap().duplicates_removed, 1);
//! assert_eq!(out.column("amount").unwrap().data_type, DataType::Float64);
//! assert!(out.column("_year").is_some());
//! ```

mod cast;
mod dedup;
mod derive;
mod normalize;
mod nulls;
mod stats;
mod validate;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDateTime, Utc};
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use crate::config::{NullHandling, TransformConfig};
use crate::error::ConfigResult;
use crate::execution::{build_pool, TransformEvent, TransformObserver};
use crate::types::Table;

pub use cast::{cast_types, is_date_like, parse_timestamp, DATE_KEYWORDS, NUMERIC_RATIO_THRESHOLD};
pub use dedup::deduplicate;
pub use derive::{
    add_derived_fields, row_hash, DAY_COLUMN, MONTH_COLUMN, PROCESSED_AT_COLUMN, ROW_HASH_COLUMN,
    YEAR_COLUMN,
};
pub use normalize::{normalize_columns, normalize_name};
pub use nulls::{handle_nulls, NULL_FLAG_SUFFIX};
pub use stats::{
    DeduplicationStats, NullHandlingStats, Stage, TransformStats, TransformStatus, TypeCastStats,
    ValidationReport,
};
pub use validate::{validate, CARDINALITY_MIN_ROWS, CARDINALITY_RATIO_THRESHOLD};

/// Runs the transform pipeline with a fixed configuration.
///
/// A transformer holds no per-run state; it can be shared across threads and reused for any
/// number of tables.
pub struct Transformer {
    config: TransformConfig,
    pool: ThreadPool,
    observer: Option<Arc<dyn TransformObserver>>,
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("config", &self.config)
            .field("num_threads", &self.pool.current_num_threads())
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Transformer {
    /// Validate `config` and build a transformer.
    ///
    /// Fails on an invalid date format hint, a zero thread count, or if the worker pool cannot
    /// be created. No data is touched before this succeeds.
    pub fn new(config: TransformConfig) -> ConfigResult<Self> {
        config.validate()?;
        let pool = build_pool(config.num_threads)?;
        Ok(Self {
            config,
            pool,
            observer: None,
        })
    }

    /// Attach an observer for stage events.
    pub fn with_observer(mut self, observer: Arc<dyn TransformObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configuration this transformer was built with.
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform `table`, stamping `_processed_at` with the current UTC time.
    pub fn transform(&self, table: Table) -> (Table, TransformStats) {
        self.transform_at(table, Utc::now().naive_utc())
    }

    /// Transform `table`, stamping `_processed_at` with `processed_at`.
    ///
    /// An empty table (no rows or no columns) is returned unchanged with
    /// [`TransformStats::empty_input`]; no stage runs.
    pub fn transform_at(&self, table: Table, processed_at: NaiveDateTime) -> (Table, TransformStats) {
        if table.is_empty() {
            info!(columns = table.column_count(), "empty input, skipping transformation");
            self.emit(TransformEvent::EmptyInput {
                columns: table.column_count(),
            });
            return (table, TransformStats::empty_input());
        }
        self.pool.install(|| self.run(table, processed_at))
    }

    fn run(&self, table: Table, processed_at: NaiveDateTime) -> (Table, TransformStats) {
        let start = Instant::now();
        let mut stats = TransformStats::started(&table);
        let policy: NullHandling = self.config.null_handling;

        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            null_handling = %policy,
            "starting transformation"
        );
        self.emit(TransformEvent::RunStarted {
            rows: table.row_count(),
            columns: table.column_count(),
        });

        let (table, ()) = self.stage(Stage::CleanColumnNames, &mut stats, || {
            (normalize_columns(table), ())
        });

        let (table, null_stats) =
            self.stage(Stage::NullHandling, &mut stats, || handle_nulls(table, policy));
        debug!(
            total_nulls = null_stats.total_nulls_found,
            rows_dropped = null_stats.rows_dropped,
            cells_filled = null_stats.cells_filled,
            flag_columns = null_stats.flag_columns.len(),
            "null handling done"
        );
        stats.null_handling = Some(null_stats);

        let (table, dedup_stats) = self.stage(Stage::Deduplication, &mut stats, || deduplicate(table));
        debug!(duplicates_removed = dedup_stats.duplicates_removed, "deduplication done");
        stats.deduplication = Some(dedup_stats);

        let date_format = self.config.date_format.as_str();
        let (table, cast_stats) =
            self.stage(Stage::TypeCasting, &mut stats, || cast_types(table, date_format));
        debug!(converted = cast_stats.converted.len(), "type casting done");
        stats.type_casting = Some(cast_stats);

        let (table, ()) = self.stage(Stage::DerivedFields, &mut stats, || {
            (add_derived_fields(table, processed_at), ())
        });

        let validation_start = Instant::now();
        self.emit(TransformEvent::StageStarted {
            stage: Stage::Validation,
        });
        let report = validate(&table);
        self.emit(TransformEvent::StageFinished {
            stage: Stage::Validation,
            rows: table.row_count(),
            columns: table.column_count(),
            elapsed: validation_start.elapsed(),
        });
        for warning in &report.warnings {
            warn!(%warning, "validation warning");
        }

        let is_valid = report.is_valid;
        stats.finish(&table, report);

        info!(
            output_rows = stats.output_rows,
            output_columns = stats.output_columns,
            rows_removed = stats.rows_removed,
            is_valid,
            "transformation complete"
        );
        self.emit(TransformEvent::RunFinished {
            elapsed: start.elapsed(),
            output_rows: stats.output_rows,
            output_columns: stats.output_columns,
            is_valid,
        });

        (table, stats)
    }

    /// Run one table-producing stage, timing it and recording it as applied.
    fn stage<T, F>(&self, stage: Stage, stats: &mut TransformStats, f: F) -> (Table, T)
    where
        F: FnOnce() -> (Table, T),
    {
        let start = Instant::now();
        self.emit(TransformEvent::StageStarted { stage });
        let (table, out) = f();
        let elapsed = start.elapsed();
        debug!(%stage, rows = table.row_count(), columns = table.column_count(), ?elapsed, "stage finished");
        self.emit(TransformEvent::StageFinished {
            stage,
            rows: table.row_count(),
            columns: table.column_count(),
            elapsed,
        });
        stats.transformations_applied.push(stage);
        (table, out)
    }

    fn emit(&self, event: TransformEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
