//! Conformed dimensions, fully recomputed from the canonical snapshots every run.
//!
//! Dimensions are "latest snapshot": a member that disappears from the sources
//! disappears from its table. Fact partitions already loaded keep whatever key
//! binding they were written with.

#![allow(clippy::result_large_err)]

use crate::core::config::{DimensionRules, KeysConfig};
use crate::core::error::AppError;
use crate::core::keys::{self, find_collisions, KeyGenerator};
use crate::core::layout::GoldTable;
use crate::core::normalize::vocabulary::{
    EVENT_TIME, FRANCHISE_CODE, LINE_CODE, OPERATING_COMPANY, TRIP_DATE, VEHICLE_ID,
};
use crate::core::report::DimensionReport;
use crate::core::snapshots::SnapshotSet;
use crate::core::types::ErrorCategory;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use transit_star_types::{CanonicalRule, SourceKind, Table, Value};

pub const DATE: &str = "date";
pub const DATE_KEY: &str = "date_key";

/// Entity dimensions keyed by a canonicalized natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DimensionKind {
    Line,
    Franchise,
    Company,
    Vehicle,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 4] = [
        DimensionKind::Line,
        DimensionKind::Franchise,
        DimensionKind::Company,
        DimensionKind::Vehicle,
    ];

    pub fn table(self) -> GoldTable {
        match self {
            DimensionKind::Line => GoldTable::DimLine,
            DimensionKind::Franchise => GoldTable::DimFranchise,
            DimensionKind::Company => GoldTable::DimCompany,
            DimensionKind::Vehicle => GoldTable::DimVehicle,
        }
    }

    /// Column holding the natural key, in snapshots and in the dimension table
    pub fn natural_column(self) -> &'static str {
        match self {
            DimensionKind::Line => LINE_CODE,
            DimensionKind::Franchise => FRANCHISE_CODE,
            DimensionKind::Company => OPERATING_COMPANY,
            DimensionKind::Vehicle => VEHICLE_ID,
        }
    }

    pub fn key_column(self) -> &'static str {
        match self {
            DimensionKind::Line => "line_key",
            DimensionKind::Franchise => "franchise_key",
            DimensionKind::Company => "company_key",
            DimensionKind::Vehicle => "vehicle_key",
        }
    }

    /// Source kinds whose natural keys are unioned into this dimension
    pub fn sources(self) -> &'static [SourceKind] {
        match self {
            DimensionKind::Line | DimensionKind::Vehicle => {
                &[SourceKind::ScheduledTrip, SourceKind::VehiclePosition]
            }
            DimensionKind::Franchise | DimensionKind::Company => &[SourceKind::ScheduledTrip],
        }
    }

    pub fn rule(self, rules: &DimensionRules) -> CanonicalRule {
        match self {
            DimensionKind::Line => rules.line,
            DimensionKind::Franchise => rules.franchise,
            DimensionKind::Company => rules.company,
            DimensionKind::Vehicle => rules.vehicle,
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// Partition key of a calendar date: `YYYYMMDD` as an integer
pub fn date_key(date: NaiveDate) -> i64 {
    date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64
}

/// Snapshot columns carrying the date of each source
pub fn date_column(kind: SourceKind) -> Option<&'static str> {
    match kind {
        SourceKind::ScheduledTrip => Some(TRIP_DATE),
        SourceKind::VehiclePosition => Some(EVENT_TIME),
        SourceKind::Unknown => None,
    }
}

/// A dimension table ready to be written
#[derive(Debug, Clone)]
pub struct BuiltDimension {
    pub table: GoldTable,
    pub data: Table,
    pub report: DimensionReport,
}

pub struct DimensionBuilder {
    keys: KeyGenerator,
    rules: DimensionRules,
    fail_on_collision: bool,
}

impl DimensionBuilder {
    pub fn new(keys: &KeysConfig, rules: DimensionRules) -> Self {
        DimensionBuilder {
            keys: KeyGenerator::new(keys.key_space),
            rules,
            fail_on_collision: keys.fail_on_collision,
        }
    }

    /// Build the date dimension and every entity dimension.
    ///
    /// Both fact sources must be present; a missing one aborts before anything is built.
    pub fn build_all(&self, snapshots: &SnapshotSet) -> Result<Vec<BuiltDimension>, AppError> {
        snapshots.require(SourceKind::ScheduledTrip)?;
        snapshots.require(SourceKind::VehiclePosition)?;

        let mut built = vec![self.build_date(snapshots)];
        for kind in DimensionKind::ALL {
            let dimension = self.build_entity(kind, snapshots);
            for collision in &dimension.report.collisions {
                tracing::warn!(
                    table = %dimension.table,
                    key = collision.key,
                    natural_keys = ?collision.natural_keys,
                    "surrogate key collision"
                );
            }
            if self.fail_on_collision && !dimension.report.collisions.is_empty() {
                return Err(AppError::new(
                    ErrorCategory::KeyCollision,
                    format!(
                        "{} has {} surrogate key collision(s)",
                        dimension.table,
                        dimension.report.collisions.len()
                    ),
                )
                .with_code("DIM-001")
                .with_suggestion("Increase keys.key_space or disable keys.fail_on_collision"));
            }
            built.push(dimension);
        }
        Ok(built)
    }

    /// Union of every valid date across sources, ascending, with calendar attributes
    pub fn build_date(&self, snapshots: &SnapshotSet) -> BuiltDimension {
        let mut dates = BTreeSet::new();
        for kind in [SourceKind::ScheduledTrip, SourceKind::VehiclePosition] {
            let (Some(table), Some(column)) = (snapshots.get(kind), date_column(kind)) else {
                continue;
            };
            if let Some(cells) = table.column(column) {
                dates.extend(cells.filter_map(Value::as_date));
            }
        }

        let rows = dates.iter().map(|date| {
            vec![
                Value::Date(*date),
                Value::Int(date_key(*date)),
                Value::Int(date.year() as i64),
                Value::Int(date.month() as i64),
                Value::Int(date.day() as i64),
                Value::text(date.format("%A").to_string()),
            ]
        });
        let data = Table::with_rows([DATE, DATE_KEY, "year", "month", "day", "weekday"], rows);

        BuiltDimension {
            table: GoldTable::DimDate,
            report: DimensionReport {
                table: GoldTable::DimDate.to_string(),
                members: data.len(),
                collisions: Vec::new(),
            },
            data,
        }
    }

    /// Canonical natural keys from every relevant source, deduplicated and sorted
    pub fn build_entity(&self, kind: DimensionKind, snapshots: &SnapshotSet) -> BuiltDimension {
        let rule = kind.rule(&self.rules);
        let mut naturals = BTreeSet::new();
        for source in kind.sources() {
            let Some(cells) = snapshots
                .get(*source)
                .and_then(|table| table.column(kind.natural_column()))
            else {
                tracing::warn!(dimension = %kind, source = %source, "natural key column missing");
                continue;
            };
            naturals.extend(cells.filter_map(|cell| keys::canonicalize(cell, rule)));
        }

        let members: Vec<(String, i64)> = naturals
            .into_iter()
            .map(|natural| {
                let key = self.keys.key_for_canonical(&natural);
                (natural, key)
            })
            .collect();
        let collisions = find_collisions(members.iter().map(|(n, k)| (n.as_str(), *k)));

        let data = Table::with_rows(
            [kind.natural_column(), kind.key_column()],
            members
                .into_iter()
                .map(|(natural, key)| vec![Value::Text(natural), Value::Int(key)]),
        );

        BuiltDimension {
            table: kind.table(),
            report: DimensionReport {
                table: kind.table().to_string(),
                members: data.len(),
                collisions,
            },
            data,
        }
    }
}
