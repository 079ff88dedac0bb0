mod common;

use assert_cmd::Command;
use chrono::NaiveDate;
use common::{day_one, gold};
use predicates::prelude::*;
use serial_test::serial;
use transit_star::core::keys::KeyGenerator;
use transit_star::core::layout::GoldTable;
use transit_star::core::report::RunReport;
use transit_star::core::storage::{self, META_SOURCE_KIND};
use transit_star::core::{Pipeline, PipelineConfig};
use transit_star_types::{SourceKind, Value};

fn cell<'a>(table: &'a transit_star_types::Table, row: usize, column: &str) -> &'a Value {
    &table.rows()[row][table.column_index(column).unwrap()]
}

/// "038" in the trip extract and 38 in the position feed are one line
#[test]
#[serial]
fn test_same_line_resolves_to_one_key_across_sources() {
    let dir = day_one();
    let report = Pipeline::new(dir.path(), PipelineConfig::default())
        .run()
        .unwrap();
    assert_eq!(report.normalize.len(), 2);

    let generator = KeyGenerator::new(100_000_000);
    let line_key = Value::Int(generator.key_for_canonical("38"));
    let vehicle_key = Value::Int(generator.key_for_canonical("1234"));

    let dim_line = gold(dir.path(), GoldTable::DimLine);
    assert_eq!(dim_line.len(), 1);
    assert_eq!(cell(&dim_line, 0, "line_code"), &Value::text("38"));
    assert_eq!(cell(&dim_line, 0, "line_key"), &line_key);

    let fact_trip = gold(dir.path(), GoldTable::FactTrip);
    let fact_event = gold(dir.path(), GoldTable::FactVehicleEvent);
    assert_eq!(fact_trip.len(), 2);
    assert_eq!(fact_event.len(), 2);
    for fact in [&fact_trip, &fact_event] {
        for row in 0..fact.len() {
            assert_eq!(cell(fact, row, "date_key"), &Value::Int(20260201));
            assert_eq!(cell(fact, row, "line_key"), &line_key);
            assert_eq!(cell(fact, row, "vehicle_key"), &vehicle_key);
        }
    }
}

#[test]
#[serial]
fn test_gold_tables_carry_typed_columns() {
    let dir = day_one();
    Pipeline::new(dir.path(), PipelineConfig::default())
        .run()
        .unwrap();

    let dim_date = gold(dir.path(), GoldTable::DimDate);
    assert_eq!(dim_date.len(), 1);
    assert_eq!(
        cell(&dim_date, 0, "date"),
        &Value::Date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
    );
    assert_eq!(cell(&dim_date, 0, "weekday"), &Value::text("Sunday"));

    let dim_company = gold(dir.path(), GoldTable::DimCompany);
    assert_eq!(cell(&dim_company, 0, "operating_company"), &Value::text("viação sorriso"));

    let fact_event = gold(dir.path(), GoldTable::FactVehicleEvent);
    assert_eq!(cell(&fact_event, 0, "latitude"), &Value::Float(-19.9191));
    assert_eq!(cell(&fact_event, 0, "longitude"), &Value::Float(-43.9279));
    assert!(matches!(cell(&fact_event, 0, "ingested_at"), Value::Timestamp(_)));

    let fact_trip = gold(dir.path(), GoldTable::FactTrip);
    assert_eq!(cell(&fact_trip, 0, "trip_length"), &Value::Float(12500.5));
    assert!(cell(&fact_trip, 0, "occurrence_flag").is_null());
}

#[test]
#[serial]
fn test_snapshots_are_tagged_and_reported() {
    let dir = day_one();
    let pipeline = Pipeline::new(dir.path(), PipelineConfig::default());
    let report = pipeline.run().unwrap();

    let snapshot = dir.path().join("data/silver/tempo_real.parquet");
    let metadata = storage::read_metadata(&snapshot).unwrap();
    assert_eq!(
        metadata.get(META_SOURCE_KIND).map(String::as_str),
        Some(SourceKind::VehiclePosition.as_str())
    );

    let positions = report
        .normalize
        .iter()
        .find(|s| s.kind == SourceKind::VehiclePosition)
        .unwrap();
    assert_eq!(positions.coercion_nulls.get("event_time"), Some(&1));
    let trips = report
        .normalize
        .iter()
        .find(|s| s.kind == SourceKind::ScheduledTrip)
        .unwrap();
    assert_eq!(trips.duplicate_rows_dropped, 1);
    assert_eq!(
        trips.empty_columns_dropped,
        vec!["ocorrencia".to_string(), "justificativa".to_string()]
    );

    let event_fact = report
        .facts
        .iter()
        .find(|f| f.table == "fact_vehicle_event")
        .unwrap();
    assert_eq!(event_fact.rows_outside_date_dimension, 1);

    let saved = RunReport::latest(&pipeline.layout().runs_dir())
        .unwrap()
        .unwrap();
    assert_eq!(saved.run_id, report.run_id);
    assert!(saved.finished_at.is_some());
}

#[test]
#[serial]
fn test_missing_source_is_fatal_before_dimensions_are_written() {
    let dir = common::workspace(&[("mco.csv", common::TRIPS_DAY_ONE)]);
    let err = Pipeline::new(dir.path(), PipelineConfig::default())
        .run()
        .unwrap_err();
    assert_eq!(err.code, "RUN-005");
    assert_eq!(err.stage(), Some("dimensions"));
    assert!(!dir.path().join("data/gold/dim_line.parquet").exists());
}

#[test]
#[serial]
fn test_cli_run_prints_json_report() {
    let dir = day_one();
    Command::new(assert_cmd::cargo::cargo_bin!("transit-star"))
        .arg("run")
        .arg(dir.path())
        .args(["--format", "json"])
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"run_id\""))
        .stdout(predicate::str::contains("fact_vehicle_event"));

    Command::new(assert_cmd::cargo::cargo_bin!("transit-star"))
        .arg("status")
        .arg(dir.path())
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("fact_trip"))
        .stdout(predicate::str::contains("20260201..20260201"));
}

#[test]
#[serial]
fn test_cli_reports_fatal_errors() {
    let dir = common::workspace(&[("tempo_real.csv", common::POSITIONS_DAY_ONE)]);
    Command::new(assert_cmd::cargo::cargo_bin!("transit-star"))
        .arg("run")
        .arg(dir.path())
        .env("TRANSIT_SCHEDULED", "1")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("RUN-005"))
        .stderr(predicate::str::contains("stage=dimensions"));
}
