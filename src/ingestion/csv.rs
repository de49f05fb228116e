//! CSV ingestion implementation.

use std::path::Path;

use crate::error::IngestionResult;
use crate::types::Table;

use super::columns::{column_from_text, is_na};

/// Ingest a CSV file into an in-memory [`Table`].
///
/// Rules:
///
/// - CSV must have a header row; header cells become column names as written.
/// - Every record must have as many fields as the header.
/// - Empty cells and NA tokens (`NA`, `null`, `NaN`, ...) become nulls.
/// - Column types are inferred from the remaining cells.
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> IngestionResult<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<Table> {
    let headers = rdr.headers()?.clone();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result?;
        for (column, raw) in cells.iter_mut().zip(record.iter()) {
            column.push((!is_na(raw)).then(|| raw.to_string()));
        }
    }

    let columns = headers
        .iter()
        .zip(cells)
        .map(|(name, column)| column_from_text(name.to_string(), column))
        .collect();
    Ok(Table::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::ingest_csv_from_reader;
    use crate::types::{DataType, Value};

    fn read(input: &str) -> crate::error::IngestionResult<crate::types::Table> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(input.as_bytes());
        ingest_csv_from_reader(&mut rdr)
    }

    #[test]
    fn reads_and_types_columns() {
        let t = read("Order ID,Unit Price ($),Active\nA1,9.99,true\nA2,,false\n").unwrap();
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["Order ID", "Unit Price ($)", "Active"]);
        assert_eq!(t.column("Unit Price ($)").unwrap().data_type, DataType::Float64);
        assert_eq!(t.column("Unit Price ($)").unwrap().values[1], Value::Null);
        assert_eq!(t.column("Active").unwrap().data_type, DataType::Bool);
        assert_eq!(t.column("Order ID").unwrap().values[0], Value::from("A1"));
    }

    #[test]
    fn header_only_gives_zero_rows() {
        let t = read("a,b\n").unwrap();
        assert_eq!(t.column_count(), 2);
        assert_eq!(t.row_count(), 0);
        assert!(t.is_empty());
    }

    #[test]
    fn ragged_records_are_an_error() {
        let err = read("a,b\n1,2\n3\n").unwrap_err();
        assert!(err.to_string().starts_with("csv error"));
    }
}
