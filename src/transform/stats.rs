//! Statistics accumulated by a transform run.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::NullHandling;
use crate::types::{DataType, Schema, Table};

/// One step of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Column name normalization.
    CleanColumnNames,
    /// The configured null policy.
    NullHandling,
    /// Exact-duplicate row removal.
    Deduplication,
    /// Timestamp and numeric inference.
    TypeCasting,
    /// `_processed_at`, `_row_hash` and partition columns.
    DerivedFields,
    /// Read-only quality report.
    Validation,
}

impl Stage {
    /// Snake-case stage name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::CleanColumnNames => "clean_column_names",
            Stage::NullHandling => "null_handling",
            Stage::Deduplication => "deduplication",
            Stage::TypeCasting => "type_casting",
            Stage::DerivedFields => "derived_fields",
            Stage::Validation => "validation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the pipeline ran or short-circuited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformStatus {
    /// Every stage ran.
    Completed,
    /// The input had no rows; nothing ran.
    EmptyInput,
}

/// What the null handler saw and did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullHandlingStats {
    /// Policy that was applied.
    pub method: NullHandling,
    /// Null count per column, taken before the policy touched any value.
    pub null_counts_before: BTreeMap<String, usize>,
    /// Sum of `null_counts_before`.
    pub total_nulls_found: usize,
    /// Rows removed by `drop`.
    pub rows_dropped: usize,
    /// Cells replaced by `fill`.
    pub cells_filled: usize,
    /// Indicator columns appended by `flag`, in column order.
    pub flag_columns: Vec<String>,
}

/// Row counts around deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeduplicationStats {
    /// Rows entering the stage.
    pub rows_before: usize,
    /// Rows left after removing duplicates.
    pub rows_after: usize,
    /// `rows_before - rows_after`.
    pub duplicates_removed: usize,
}

/// Columns retyped by the caster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TypeCastStats {
    /// New type of every converted column.
    pub converted: BTreeMap<String, DataType>,
    /// Per converted column, how many non-null source cells failed to parse and became null.
    pub coerced_to_null: BTreeMap<String, usize>,
}

/// Read-only quality report over the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// `true` iff `warnings` is empty.
    pub is_valid: bool,
    /// Rows in the final table.
    pub row_count: usize,
    /// Columns in the final table, derived ones included.
    pub column_count: usize,
    /// Every output column with its type, in column order. Serialized as a
    /// `{column: type}` object.
    #[serde(serialize_with = "schema_as_map")]
    pub schema: Schema,
    /// Residual-null warnings in column order, then high-cardinality warnings.
    pub warnings: Vec<String>,
}

fn schema_as_map<S: Serializer>(schema: &Schema, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(schema.len()))?;
    for field in &schema.fields {
        map.serialize_entry(&field.name, &field.data_type)?;
    }
    map.end()
}

/// Statistics for one transform run.
///
/// Stage sub-records are filled once each, in pipeline order. An empty input produces a record
/// with only `status` and `rows_processed` set, and serializes to exactly those two keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformStats {
    /// Whether the pipeline ran.
    pub status: TransformStatus,
    /// Rows handed to the transformer.
    pub rows_processed: usize,
    /// Rows in the input table.
    pub input_rows: usize,
    /// Columns in the input table.
    pub input_columns: usize,
    /// Rows in the output table.
    pub output_rows: usize,
    /// Columns in the output table.
    pub output_columns: usize,
    /// Rows removed by null dropping and deduplication together.
    pub rows_removed: usize,
    /// Table-producing stages that ran, in order.
    pub transformations_applied: Vec<Stage>,
    /// Null handling record.
    pub null_handling: Option<NullHandlingStats>,
    /// Deduplication record.
    pub deduplication: Option<DeduplicationStats>,
    /// Type casting record.
    pub type_casting: Option<TypeCastStats>,
    /// Validation report over the output table.
    pub validation: Option<ValidationReport>,
}

impl TransformStats {
    /// The record returned when the pipeline short-circuits on an empty table.
    pub fn empty_input() -> Self {
        Self {
            status: TransformStatus::EmptyInput,
            rows_processed: 0,
            input_rows: 0,
            input_columns: 0,
            output_rows: 0,
            output_columns: 0,
            rows_removed: 0,
            transformations_applied: Vec::new(),
            null_handling: None,
            deduplication: None,
            type_casting: None,
            validation: None,
        }
    }

    pub(crate) fn started(input: &Table) -> Self {
        Self {
            status: TransformStatus::Completed,
            rows_processed: input.row_count(),
            input_rows: input.row_count(),
            input_columns: input.column_count(),
            ..Self::empty_input()
        }
    }

    pub(crate) fn finish(&mut self, output: &Table, validation: ValidationReport) {
        self.output_rows = output.row_count();
        self.output_columns = output.column_count();
        self.rows_removed = self.input_rows.saturating_sub(self.output_rows);
        self.validation = Some(validation);
    }

    /// Returns `true` if the run short-circuited on an empty input.
    pub fn is_empty_input(&self) -> bool {
        self.status == TransformStatus::EmptyInput
    }

    /// Returns `true` if validation ran and produced no warnings.
    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().is_some_and(|v| v.is_valid)
    }
}

impl Serialize for TransformStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_empty_input() {
            let mut map = serializer.serialize_map(Some(2))?;
            map.serialize_entry("status", &self.status)?;
            map.serialize_entry("rows_processed", &self.rows_processed)?;
            return map.end();
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("rows_processed", &self.rows_processed)?;
        map.serialize_entry("input_rows", &self.input_rows)?;
        map.serialize_entry("input_columns", &self.input_columns)?;
        map.serialize_entry("output_rows", &self.output_rows)?;
        map.serialize_entry("output_columns", &self.output_columns)?;
        map.serialize_entry("rows_removed", &self.rows_removed)?;
        map.serialize_entry("transformations_applied", &self.transformations_applied)?;
        if let Some(v) = &self.null_handling {
            map.serialize_entry("null_handling", v)?;
        }
        if let Some(v) = &self.deduplication {
            map.serialize_entry("deduplication", v)?;
        }
        if let Some(v) = &self.type_casting {
            map.serialize_entry("type_casting", v)?;
        }
        if let Some(v) = &self.validation {
            map.serialize_entry("validation", v)?;
        }
        map.end()
    }
}
