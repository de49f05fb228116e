use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use parquet::column::writer::ColumnWriter;
use parquet::data_type::ByteArray;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

use tabular_transform::ingestion::parquet::ingest_parquet_from_path;
use tabular_transform::ingestion::{ingest_from_path, IngestionOptions};
use tabular_transform::types::{DataType, Value};
use tabular_transform::{IngestionError, NullHandling, TransformConfig, Transformer};

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-transform-{name}-{nanos}.parquet"))
}

fn write_orders_parquet(path: &PathBuf) {
    let schema_str = r#"
        message schema {
          REQUIRED BINARY order_id (UTF8);
          OPTIONAL INT64 quantity;
          REQUIRED DOUBLE amount;
          REQUIRED BOOLEAN paid;
          REQUIRED INT64 created_at (TIMESTAMP_MILLIS);
        }
    "#;

    let schema = Arc::new(parse_message_type(schema_str).unwrap());
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, props).unwrap();

    let mut rg = writer.next_row_group().unwrap();
    let mut col_idx: usize = 0;
    while let Some(mut col) = rg.next_column().unwrap() {
        match (col_idx, col.untyped()) {
            (0, ColumnWriter::ByteArrayColumnWriter(w)) => {
                w.write_batch(&[ByteArray::from("A1"), ByteArray::from("A2")], None, None)
                    .unwrap();
            }
            (1, ColumnWriter::Int64ColumnWriter(w)) => {
                // second row is null
                w.write_batch(&[3_i64], Some(&[1, 0]), None).unwrap();
            }
            (2, ColumnWriter::DoubleColumnWriter(w)) => {
                w.write_batch(&[10.5_f64, 20.0_f64], None, None).unwrap();
            }
            (3, ColumnWriter::BoolColumnWriter(w)) => {
                w.write_batch(&[true, false], None, None).unwrap();
            }
            (4, ColumnWriter::Int64ColumnWriter(w)) => {
                // 2024-01-01 and 2024-01-02, UTC midnight
                w.write_batch(&[1_704_067_200_000_i64, 1_704_153_600_000_i64], None, None)
                    .unwrap();
            }
            _ => panic!("unexpected column writer in test"),
        }
        col.close().unwrap();
        col_idx += 1;
    }
    rg.close().unwrap();
    writer.close().unwrap();
}

#[test]
fn ingest_parquet_keeps_stored_types() {
    let path = tmp_file("orders");
    write_orders_parquet(&path);

    let t = ingest_parquet_from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(t.row_count(), 2);
    assert_eq!(
        t.column_names().collect::<Vec<_>>(),
        vec!["order_id", "quantity", "amount", "paid", "created_at"]
    );
    assert_eq!(t.column("order_id").unwrap().values, vec![Value::from("A1"), Value::from("A2")]);
    assert_eq!(t.column("quantity").unwrap().data_type, DataType::Int64);
    assert_eq!(t.column("quantity").unwrap().values, vec![Value::Int64(3), Value::Null]);
    assert_eq!(t.column("amount").unwrap().data_type, DataType::Float64);
    assert_eq!(t.column("paid").unwrap().values, vec![Value::Bool(true), Value::Bool(false)]);

    let created = t.column("created_at").unwrap();
    assert_eq!(created.data_type, DataType::Timestamp);
    assert_eq!(
        created.values[1],
        Value::Timestamp(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap())
    );
}

#[test]
fn parquet_table_feeds_the_pipeline() {
    let path = tmp_file("pipeline");
    write_orders_parquet(&path);

    let table = ingest_from_path(&path, &IngestionOptions::default()).unwrap();
    let _ = std::fs::remove_file(&path);

    let transformer = Transformer::new(TransformConfig::default().with_null_handling(NullHandling::Fill)).unwrap();
    let (out, stats) = transformer.transform(table);

    assert_eq!(out.row_count(), 2);
    assert_eq!(out.column("quantity").unwrap().values[1], Value::Int64(0));
    assert_eq!(out.column("_year").unwrap().values, vec![Value::Int64(2024), Value::Int64(2024)]);
    assert_eq!(out.column("_day").unwrap().values, vec![Value::Int64(1), Value::Int64(2)]);
    assert!(stats.type_casting.unwrap().converted.is_empty());
}

#[test]
fn non_parquet_bytes_are_a_parquet_error() {
    let err = ingest_parquet_from_path("tests/fixtures/orders.csv").unwrap_err();
    assert!(matches!(err, IngestionError::Parquet(_)));
}
