//! Checks a downstream consumer runs against the gold layer after every load.

mod common;

use common::{day_one, gold, replace_extracts, POSITIONS_DAY_TWO, TRIPS_DAY_TWO};
use serial_test::serial;
use std::collections::HashSet;
use std::path::Path;
use transit_star::core::dimensions::DimensionKind;
use transit_star::core::facts::FactKind;
use transit_star::core::layout::GoldTable;
use transit_star::core::{Pipeline, PipelineConfig};
use transit_star_types::Value;

fn loaded_twice() -> tempfile::TempDir {
    let dir = day_one();
    let pipeline = Pipeline::new(dir.path(), PipelineConfig::default());
    pipeline.run().unwrap();
    replace_extracts(
        dir.path(),
        &[("mco.csv", TRIPS_DAY_TWO), ("tempo_real.csv", POSITIONS_DAY_TWO)],
    );
    pipeline.run().unwrap();
    dir
}

fn keys_of(root: &Path, kind: DimensionKind) -> HashSet<i64> {
    gold(root, kind.table())
        .column(kind.key_column())
        .unwrap()
        .filter_map(Value::as_int)
        .collect()
}

#[test]
#[serial]
fn test_date_keys_are_unique() {
    let dir = loaded_twice();
    let dim_date = gold(dir.path(), GoldTable::DimDate);
    let keys: Vec<i64> = dim_date.column("date_key").unwrap().filter_map(Value::as_int).collect();
    let unique: HashSet<i64> = keys.iter().copied().collect();
    assert_eq!(keys.len(), dim_date.len());
    assert_eq!(unique.len(), keys.len());
}

#[test]
#[serial]
fn test_line_natural_keys_are_present() {
    let dir = loaded_twice();
    let dim_line = gold(dir.path(), GoldTable::DimLine);
    assert!(!dim_line.is_empty());
    assert!(dim_line.column("line_code").unwrap().all(|v| !v.is_null()));
}

#[test]
#[serial]
fn test_every_fact_row_has_a_loaded_date() {
    let dir = loaded_twice();
    let dates: HashSet<i64> = gold(dir.path(), GoldTable::DimDate)
        .column("date_key")
        .unwrap()
        .filter_map(Value::as_int)
        .collect();
    for kind in FactKind::ALL {
        let fact = gold(dir.path(), kind.table());
        for cell in fact.column("date_key").unwrap() {
            let key = cell.as_int().expect("fact date_key is never null");
            assert!(dates.contains(&key), "{} has partition {} outside dim_date", kind.table(), key);
        }
    }
}

#[test]
#[serial]
fn test_foreign_keys_close_over_dimensions() {
    let dir = loaded_twice();
    for kind in FactKind::ALL {
        let fact = gold(dir.path(), kind.table());
        for dimension in kind.dimensions() {
            let known = keys_of(dir.path(), *dimension);
            for key in fact.column(dimension.key_column()).unwrap().filter_map(Value::as_int) {
                assert!(
                    known.contains(&key),
                    "{}.{} = {} missing from {}",
                    kind.table(),
                    dimension.key_column(),
                    key,
                    dimension.table()
                );
            }
        }
    }
}

#[test]
#[serial]
fn test_coordinates_are_in_range() {
    let dir = loaded_twice();
    let events = gold(dir.path(), GoldTable::FactVehicleEvent);
    for lat in events.column("latitude").unwrap().filter_map(Value::as_float) {
        assert!((-90.0..=90.0).contains(&lat));
    }
    for lon in events.column("longitude").unwrap().filter_map(Value::as_float) {
        assert!((-180.0..=180.0).contains(&lon));
    }
}
