use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;
use tabular_transform::ingestion::csv::ingest_csv_from_path;
use tabular_transform::transform::{Stage, TransformStatus};
use tabular_transform::types::{Column, DataType, Field, Schema, Table, Value};
use tabular_transform::{NullHandling, TransformConfig, Transformer};

fn run_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap().and_hms_opt(23, 59, 0).unwrap()
}

fn transformer(policy: NullHandling) -> Transformer {
    Transformer::new(TransformConfig::default().with_null_handling(policy)).unwrap()
}

fn orders() -> Table {
    ingest_csv_from_path("tests/fixtures/orders.csv").unwrap()
}

fn names(t: &Table) -> Vec<&str> {
    t.column_names().collect()
}

#[test]
fn clean_table_gets_normalized_names_and_derived_fields() {
    let table = Table::from_rows(
        Schema::new(vec![
            Field::new("Order ID", DataType::Utf8),
            Field::new("Unit Price ($)", DataType::Utf8),
        ]),
        vec![
            vec!["A1".into(), "9.99".into()],
            vec!["A2".into(), "15".into()],
        ],
    )
    .unwrap();

    let (out, stats) = transformer(NullHandling::Drop).transform_at(table, run_at());

    assert_eq!(names(&out), vec!["order_id", "unit_price", "_processed_at", "_row_hash"]);
    assert_eq!(out.column("unit_price").unwrap().data_type, DataType::Float64);
    assert_eq!(
        out.column("unit_price").unwrap().values,
        vec![Value::Float64(9.99), Value::Float64(15.0)]
    );
    assert_eq!(out.column("_row_hash").unwrap().data_type, DataType::Int64);
    assert_eq!(stats.status, TransformStatus::Completed);
    assert_eq!(stats.rows_processed, 2);
    assert_eq!(stats.rows_removed, 0);
    assert!(stats.is_valid());
}

#[test]
fn empty_input_is_returned_unchanged() {
    let table = Table::from_rows(Schema::new(vec![Field::new("Order ID", DataType::Utf8)]), vec![]).unwrap();

    let (out, stats) = transformer(NullHandling::Fill).transform(table.clone());

    assert_eq!(out, table);
    assert!(stats.is_empty_input());
    assert_eq!(
        serde_json::to_value(&stats).unwrap(),
        json!({"status": "empty_input", "rows_processed": 0})
    );
}

#[test]
fn drop_removes_null_rows_then_duplicates() {
    let (out, stats) = transformer(NullHandling::Drop).transform_at(orders(), run_at());

    let nulls = stats.null_handling.as_ref().unwrap();
    assert_eq!(nulls.rows_dropped, 3);
    assert_eq!(stats.deduplication.unwrap().duplicates_removed, 1);
    assert_eq!(out.row_count(), 1);
    assert_eq!(stats.rows_removed, 4);
    assert!(out.columns().iter().all(|c| !c.has_nulls()));
    assert!(stats.is_valid());
}

#[test]
fn null_counts_are_taken_before_the_policy() {
    for policy in [NullHandling::Drop, NullHandling::Fill, NullHandling::Flag] {
        let (_, stats) = transformer(policy).transform_at(orders(), run_at());
        let nulls = stats.null_handling.unwrap();
        assert_eq!(nulls.method, policy);
        assert_eq!(nulls.total_nulls_found, 3);
        assert_eq!(nulls.null_counts_before["customer_name"], 1);
        assert_eq!(nulls.null_counts_before["quantity"], 1);
        assert_eq!(nulls.null_counts_before["status"], 1);
        assert_eq!(nulls.null_counts_before["order_id"], 0);
    }
}

#[test]
fn fill_keeps_rows_and_casts_dates() {
    let (out, stats) = transformer(NullHandling::Fill).transform_at(orders(), run_at());

    assert_eq!(out.row_count(), 4);
    assert_eq!(stats.null_handling.as_ref().unwrap().cells_filled, 3);
    assert_eq!(out.column("quantity").unwrap().values[3], Value::Int64(0));
    assert_eq!(out.column("status").unwrap().values[1], Value::from(""));

    let cast = stats.type_casting.as_ref().unwrap();
    assert_eq!(cast.converted.get("order_date"), Some(&DataType::Timestamp));
    assert_eq!(cast.coerced_to_null.get("order_date"), Some(&1));

    assert_eq!(
        names(&out),
        vec![
            "order_id",
            "customer_name",
            "order_date",
            "unit_price",
            "quantity",
            "status",
            "_processed_at",
            "_row_hash",
            "_year",
            "_month",
            "_day",
        ]
    );
    assert_eq!(
        out.column("_year").unwrap().values,
        vec![Value::Int64(2024), Value::Int64(2024), Value::Int64(2024), Value::Null]
    );
    assert_eq!(
        out.column("_month").unwrap().values,
        vec![Value::Int64(1), Value::Int64(1), Value::Int64(2), Value::Null]
    );

    let report = stats.validation.as_ref().unwrap();
    assert!(!report.is_valid);
    assert!(report.warnings.contains(&"Column 'order_date' contains 1 null value(s)".to_string()));
}

#[test]
fn flag_appends_indicators_and_keeps_nulls() {
    let (out, stats) = transformer(NullHandling::Flag).transform_at(orders(), run_at());

    assert_eq!(out.row_count(), 4);
    assert_eq!(
        stats.null_handling.as_ref().unwrap().flag_columns,
        vec!["customer_name_is_null", "quantity_is_null", "status_is_null"]
    );
    let flag = out.column("quantity_is_null").unwrap();
    assert_eq!(flag.data_type, DataType::Bool);
    assert_eq!(
        flag.values,
        vec![Value::Bool(false), Value::Bool(false), Value::Bool(false), Value::Bool(true)]
    );
    assert_eq!(out.column("quantity").unwrap().values[3], Value::Null);
    assert_eq!(out.column_count(), 14);
    assert!(!stats.is_valid());
}

#[test]
fn without_timestamp_column_no_partitions_are_added() {
    let table = Table::new(vec![Column::new(
        "Shipping Notes",
        DataType::Utf8,
        vec!["fragile".into(), "none".into()],
    )])
    .unwrap();

    let (out, _) = transformer(NullHandling::Drop).transform_at(table, run_at());
    assert!(out.column("_year").is_none());
    assert!(out.column("_month").is_none());
    assert!(out.column("_day").is_none());
}

#[test]
fn duplicates_are_judged_on_raw_values() {
    // "1" and "1.0" differ before casting, so both rows survive.
    let table = Table::new(vec![Column::new(
        "amount",
        DataType::Utf8,
        vec!["1".into(), "1.0".into(), "1".into()],
    )])
    .unwrap();

    let (out, stats) = transformer(NullHandling::Drop).transform_at(table, run_at());
    assert_eq!(stats.deduplication.unwrap().duplicates_removed, 1);
    assert_eq!(out.column("amount").unwrap().data_type, DataType::Float64);
    assert_eq!(
        out.column("amount").unwrap().values,
        vec![Value::Float64(1.0), Value::Float64(1.0)]
    );
}

#[test]
fn stats_serialize_with_stage_records() {
    let config = TransformConfig::from_json_str(r#"{"etl": {"transform": {"null_handling": "fill"}}}"#).unwrap();
    let (_, stats) = Transformer::new(config).unwrap().transform_at(orders(), run_at());

    assert_eq!(
        stats.transformations_applied,
        vec![
            Stage::CleanColumnNames,
            Stage::NullHandling,
            Stage::Deduplication,
            Stage::TypeCasting,
            Stage::DerivedFields,
        ]
    );

    let v = serde_json::to_value(&stats).unwrap();
    assert_eq!(v["status"], "completed");
    assert_eq!(v["rows_processed"], 5);
    assert_eq!(v["null_handling"]["method"], "fill");
    assert_eq!(v["deduplication"]["duplicates_removed"], 1);
    assert_eq!(v["type_casting"]["converted"]["order_date"], "timestamp");
    assert_eq!(v["transformations_applied"][0], "clean_column_names");
    let schema = v["validation"]["schema"].as_object().unwrap();
    assert_eq!(schema.len(), 11);
    assert_eq!(schema["order_id"], "utf8");
    assert_eq!(schema["order_date"], "timestamp");
    assert_eq!(schema["_row_hash"], "int64");
    let keys: Vec<&str> = schema.keys().map(String::as_str).collect();
    assert_eq!(&keys[..3], &["order_id", "customer_name", "order_date"]);
}
