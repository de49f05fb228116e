//! Core data model types.
//!
//! A [`Table`] is an ordered list of named, typed [`Column`]s. Every column holds exactly
//! [`Table::row_count`] values, so the `i`-th value of each column together form row `i`.
//! [`Schema`] (a list of [`Field`]s) describes the shape of a table without carrying values.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Logical data type of a column.
///
/// Any cell may be [`Value::Null`] regardless of the column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// No type information; every cell is null.
    Null,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Timezone-naive timestamp (UTC by convention).
    Timestamp,
}

impl DataType {
    /// Returns `true` for [`DataType::Int64`] and [`DataType::Float64`].
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Lower-case name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Bool => "bool",
            DataType::Utf8 => "utf8",
            DataType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered list of fields describing the shape of a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the data type of a field by name, if present.
    pub fn data_type_of(&self, name: &str) -> Option<DataType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.data_type)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Timezone-naive timestamp.
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The [`DataType`] this value naturally belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::Bool(_) => DataType::Bool,
            Value::Utf8(_) => DataType::Utf8,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    /// Borrow the string payload of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Copy the payload of a [`Value::Timestamp`].
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A named, typed column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column-level type. Cells are either of this type or [`Value::Null`].
    pub data_type: DataType,
    /// Cell values in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, data_type: DataType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Returns `true` if at least one cell is null.
    pub fn has_nulls(&self) -> bool {
        self.values.iter().any(Value::is_null)
    }

    /// The [`Field`] describing this column.
    pub fn field(&self) -> Field {
        Field::new(self.name.clone(), self.data_type)
    }

    /// Check that every non-null cell is of the column's type.
    pub fn check_cell_types(&self) -> TableResult<()> {
        match self
            .values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_null() && v.data_type() != self.data_type)
        {
            Some((row, v)) => Err(TableError::CellTypeMismatch {
                column: self.name.clone(),
                row,
                expected: self.data_type,
                actual: v.data_type(),
            }),
            None => Ok(()),
        }
    }
}

/// In-memory columnar table.
///
/// Columns are kept in insertion order and always share the same length. Stages consume a
/// table and hand back a new one; nothing aliases a caller's table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table from columns.
    ///
    /// Returns [`TableError::ColumnLengthMismatch`] if the columns differ in length, or
    /// [`TableError::CellTypeMismatch`] if a non-null cell does not match its column's type.
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        if let Some(first) = columns.first() {
            let expected = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != expected) {
                return Err(TableError::ColumnLengthMismatch {
                    column: bad.name.clone(),
                    expected,
                    actual: bad.len(),
                });
            }
        }
        columns.iter().try_for_each(Column::check_cell_types)?;
        Ok(Self { columns })
    }

    /// Create a table from a schema and row-major values.
    ///
    /// Returns [`TableError::RowWidthMismatch`] if any row's width differs from the schema, or
    /// [`TableError::CellTypeMismatch`] if a cell does not match its field's type.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> TableResult<Self> {
        let width = schema.fields.len();
        let mut columns: Vec<Column> = schema
            .fields
            .into_iter()
            .map(|f| Column::new(f.name, f.data_type, Vec::with_capacity(rows.len())))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(TableError::RowWidthMismatch {
                    row: row_idx,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        columns.iter().try_for_each(Column::check_cell_types)?;
        Ok(Self { columns })
    }

    /// Build a table from columns known to be aligned.
    pub(crate) fn from_columns_unchecked(columns: Vec<Column>) -> Self {
        debug_assert!(
            columns.windows(2).all(|w| w[0].len() == w[1].len()),
            "columns must share the same length"
        );
        debug_assert!(
            columns.iter().all(|c| c.check_cell_types().is_ok()),
            "cells must match their column type"
        );
        Self { columns }
    }

    /// Number of rows (zero for a table without columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0 || self.columns.is_empty()
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume the table, returning its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Returns the first column with the given name, if present.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the index of the first column with the given name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Describe this table's shape.
    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(Column::field).collect())
    }

    /// Borrow the cells of row `idx`, in column order.
    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Iterate rows as borrowed cells, in row order.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count()).map(move |idx| self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Append a column.
    ///
    /// Returns [`TableError::ColumnLengthMismatch`] if the column's length differs from the
    /// table's row count (a table without columns accepts any length), or
    /// [`TableError::CellTypeMismatch`] for a cell of the wrong type.
    pub fn with_column(mut self, column: Column) -> TableResult<Self> {
        let actual = column.len();
        if !self.columns.is_empty() && actual != self.row_count() {
            return Err(TableError::ColumnLengthMismatch {
                column: column.name,
                expected: self.row_count(),
                actual,
            });
        }
        column.check_cell_types()?;
        self.columns.push(column);
        Ok(self)
    }

    /// Keep only rows whose entry in `keep` is `true`, preserving order.
    ///
    /// # Panics
    ///
    /// Panics if `keep.len()` differs from the row count.
    pub fn retain_rows(self, keep: &[bool]) -> Self {
        assert!(
            keep.len() == self.row_count(),
            "keep mask length {} does not match row count {}",
            keep.len(),
            self.row_count()
        );
        let columns = self
            .columns
            .into_iter()
            .map(|c| Column {
                values: c
                    .values
                    .into_iter()
                    .zip(keep)
                    .filter_map(|(v, &k)| k.then_some(v))
                    .collect(),
                ..c
            })
            .collect();
        Self { columns }
    }
}
