//! Fact builder: resolve surrogate keys, filter by the date dimension and merge
//! into partition-addressable stores.
//!
//! A partition (`date_key`) is written at most once. Once a store holds rows for a
//! date, later runs never add, replace or reconcile rows of that date, even if the
//! source has been corrected since.

#![allow(clippy::result_large_err)]

use crate::core::config::{DimensionRules, FactsConfig};
use crate::core::dimensions::{self, DimensionKind, DATE_KEY};
use crate::core::error::AppError;
use crate::core::keys;
use crate::core::layout::GoldTable;
use crate::core::normalize::vocabulary::INGESTED_AT;
use crate::core::report::FactReport;
use crate::core::types::ErrorCategory;
use std::collections::{BTreeSet, HashMap, HashSet};
use transit_star_types::{SourceKind, Table, Value};

/// Fact tables and the source each one is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    Trip,
    VehicleEvent,
}

impl FactKind {
    pub const ALL: [FactKind; 2] = [FactKind::Trip, FactKind::VehicleEvent];

    pub fn table(self) -> GoldTable {
        match self {
            FactKind::Trip => GoldTable::FactTrip,
            FactKind::VehicleEvent => GoldTable::FactVehicleEvent,
        }
    }

    pub fn source(self) -> SourceKind {
        match self {
            FactKind::Trip => SourceKind::ScheduledTrip,
            FactKind::VehicleEvent => SourceKind::VehiclePosition,
        }
    }

    /// Dimensions joined into this fact, in output column order
    pub fn dimensions(self) -> &'static [DimensionKind] {
        match self {
            FactKind::Trip => &[
                DimensionKind::Line,
                DimensionKind::Franchise,
                DimensionKind::Company,
                DimensionKind::Vehicle,
            ],
            FactKind::VehicleEvent => &[DimensionKind::Line, DimensionKind::Vehicle],
        }
    }

    pub fn measures(self, facts: &FactsConfig) -> &[String] {
        match self {
            FactKind::Trip => &facts.trip.measures,
            FactKind::VehicleEvent => &facts.vehicle_event.measures,
        }
    }

    /// Fixed output schema: partition key, surrogate keys, measures, lineage
    pub fn columns(self, facts: &FactsConfig) -> Vec<String> {
        let mut columns = vec![DATE_KEY.to_string()];
        columns.extend(self.dimensions().iter().map(|d| d.key_column().to_string()));
        columns.extend(self.measures(facts).iter().cloned());
        columns.push(INGESTED_AT.to_string());
        columns
    }
}

/// Current dimension contents, as consulted by the fact builder
#[derive(Debug, Clone, Default)]
pub struct DimensionIndex {
    date_keys: HashSet<i64>,
    members: HashMap<DimensionKind, HashMap<String, i64>>,
}

impl DimensionIndex {
    /// Index the `date_key` column of the date dimension
    pub fn with_dates(mut self, dim_date: &Table) -> Result<Self, AppError> {
        let cells = dim_date
            .column(DATE_KEY)
            .ok_or_else(|| missing_column(GoldTable::DimDate, DATE_KEY))?;
        self.date_keys = cells.filter_map(Value::as_int).collect();
        Ok(self)
    }

    /// Index an entity dimension by natural key
    pub fn with_entity(mut self, kind: DimensionKind, dim: &Table) -> Result<Self, AppError> {
        let natural_idx = dim
            .column_index(kind.natural_column())
            .ok_or_else(|| missing_column(kind.table(), kind.natural_column()))?;
        let key_idx = dim
            .column_index(kind.key_column())
            .ok_or_else(|| missing_column(kind.table(), kind.key_column()))?;

        let members = dim
            .rows()
            .iter()
            .filter_map(|row| {
                let key = row[key_idx].as_int()?;
                (!row[natural_idx].is_null()).then(|| (row[natural_idx].to_string(), key))
            })
            .collect();
        self.members.insert(kind, members);
        Ok(self)
    }

    pub fn contains_date(&self, date_key: i64) -> bool {
        self.date_keys.contains(&date_key)
    }

    pub fn resolve(&self, kind: DimensionKind, canonical: &str) -> Option<i64> {
        self.members.get(&kind)?.get(canonical).copied()
    }
}

fn missing_column(table: GoldTable, column: &str) -> AppError {
    AppError::new(
        ErrorCategory::SchemaError,
        format!("{} has no '{}' column", table, column),
    )
    .with_code("FACT-003")
    .with_suggestion("Rebuild dimensions with `transit-star dimensions`")
}

/// Fact rows for one kind, before merging into the store
#[derive(Debug, Clone)]
pub struct BuiltFact {
    pub kind: FactKind,
    pub data: Table,
    pub report: FactReport,
}

pub struct FactBuilder<'a> {
    rules: DimensionRules,
    facts: &'a FactsConfig,
    index: &'a DimensionIndex,
}

impl<'a> FactBuilder<'a> {
    pub fn new(rules: DimensionRules, facts: &'a FactsConfig, index: &'a DimensionIndex) -> Self {
        FactBuilder {
            rules,
            facts,
            index,
        }
    }

    /// Project `snapshot` onto the fact schema of `kind`.
    ///
    /// Rows whose partition key is not in the date dimension are excluded; unresolved
    /// natural keys leave a null surrogate key and the row is kept.
    pub fn build(&self, kind: FactKind, snapshot: &Table) -> BuiltFact {
        let columns = kind.columns(self.facts);
        let mut report = FactReport {
            table: kind.table().to_string(),
            ..FactReport::default()
        };

        let date_idx = dimensions::date_column(kind.source()).and_then(|c| snapshot.column_index(c));
        let natural_idx: Vec<(DimensionKind, Option<usize>)> = kind
            .dimensions()
            .iter()
            .map(|d| (*d, snapshot.column_index(d.natural_column())))
            .collect();
        let measure_idx: Vec<Option<usize>> = kind
            .measures(self.facts)
            .iter()
            .map(|m| {
                let idx = snapshot.column_index(m);
                if idx.is_none() {
                    tracing::warn!(table = %kind.table(), measure = %m, "measure missing from snapshot, emitting nulls");
                }
                idx
            })
            .collect();
        let ingested_idx = snapshot.column_index(INGESTED_AT);

        let mut data = Table::new(columns);
        for row in snapshot.rows() {
            let date_key = date_idx
                .and_then(|idx| row[idx].as_date())
                .map(dimensions::date_key)
                .filter(|key| self.index.contains_date(*key));
            let Some(date_key) = date_key else {
                report.rows_outside_date_dimension += 1;
                continue;
            };

            let mut out = Vec::with_capacity(data.width());
            out.push(Value::Int(date_key));
            for (dimension, idx) in &natural_idx {
                let key = idx
                    .and_then(|idx| keys::canonicalize(&row[idx], dimension.rule(&self.rules)))
                    .and_then(|canonical| self.index.resolve(*dimension, &canonical));
                match key {
                    Some(key) => out.push(Value::Int(key)),
                    None => {
                        *report
                            .unresolved_keys
                            .entry(dimension.key_column().to_string())
                            .or_insert(0) += 1;
                        out.push(Value::Null);
                    }
                }
            }
            for idx in &measure_idx {
                out.push(idx.map(|idx| row[idx].clone()).unwrap_or_default());
            }
            out.push(ingested_idx.map(|idx| row[idx].clone()).unwrap_or_default());
            data.push_row(out);
        }

        report.rows_built = data.len();
        BuiltFact { kind, data, report }
    }
}

/// Result of merging incoming fact rows into an existing store
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub table: Table,
    pub partitions_already_loaded: usize,
    pub partitions_appended: usize,
    pub rows_appended: usize,
}

fn partitions(table: &Table) -> BTreeSet<i64> {
    table
        .column(DATE_KEY)
        .map(|cells| cells.filter_map(Value::as_int).collect())
        .unwrap_or_default()
}

/// Append only the incoming partitions the store does not hold yet.
///
/// Existing rows are returned untouched and in order. A store whose columns differ
/// from the incoming projection is a schema error.
pub fn merge_partitions(existing: Option<Table>, incoming: Table) -> Result<MergeOutcome, AppError> {
    let incoming_partitions = partitions(&incoming);
    let Some(mut store) = existing else {
        return Ok(MergeOutcome {
            partitions_already_loaded: 0,
            partitions_appended: incoming_partitions.len(),
            rows_appended: incoming.len(),
            table: incoming,
        });
    };

    if store.columns() != incoming.columns() {
        return Err(AppError::new(
            ErrorCategory::SchemaError,
            format!(
                "Fact store columns {:?} differ from the configured projection {:?}",
                store.columns(),
                incoming.columns()
            ),
        )
        .with_code("FACT-002")
        .with_suggestion("Restore the previous projection, or move the old store aside"));
    }

    let loaded = partitions(&store);
    let date_idx = incoming.column_index(DATE_KEY);
    let mut fresh = Table::new(incoming.columns().to_vec());
    for row in incoming.into_rows() {
        let key = date_idx.and_then(|idx| row[idx].as_int());
        if key.is_some_and(|key| !loaded.contains(&key)) {
            fresh.push_row(row);
        }
    }

    let partitions_already_loaded = incoming_partitions.intersection(&loaded).count();
    let partitions_appended = incoming_partitions.len() - partitions_already_loaded;
    let rows_appended = fresh.len();
    store.append(fresh);
    Ok(MergeOutcome {
        table: store,
        partitions_already_loaded,
        partitions_appended,
        rows_appended,
    })
}
