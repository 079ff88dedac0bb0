//! Stage driver: normalize, then dimensions, then facts, in strict order.
//!
//! Each stage reads only what the previous one persisted, so stages can also be
//! invoked on their own. Every stage computes its full output before writing any of it.

#![allow(clippy::result_large_err)]

use crate::core::config::PipelineConfig;
use crate::core::dimensions::{DimensionBuilder, DimensionKind, DATE_KEY};
use crate::core::error::AppError;
use crate::core::facts::{merge_partitions, DimensionIndex, FactBuilder, FactKind};
use crate::core::layout::{GoldTable, WarehouseLayout};
use crate::core::normalize::Normalizer;
use crate::core::report::{DimensionReport, FactReport, RunReport, SourceReport};
use crate::core::snapshots::SnapshotSet;
use crate::core::storage::{self, META_SOURCE_KIND, META_TABLE};
use crate::core::types::{ErrorCategory, Stage};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use transit_star_types::{Table, Value};

/// Row and partition counts of one gold table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStatus {
    pub table: GoldTable,
    pub present: bool,
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<PartitionSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub count: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl PartitionSummary {
    fn of(table: &Table) -> Self {
        let keys: std::collections::BTreeSet<i64> = table
            .column(DATE_KEY)
            .map(|cells| cells.filter_map(Value::as_int).collect())
            .unwrap_or_default();
        PartitionSummary {
            count: keys.len(),
            min: keys.first().copied(),
            max: keys.last().copied(),
        }
    }
}

pub struct Pipeline {
    layout: WarehouseLayout,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(root: &Path, config: PipelineConfig) -> Self {
        Pipeline {
            layout: WarehouseLayout::resolve(root, &config.paths),
            config,
        }
    }

    pub fn layout(&self) -> &WarehouseLayout {
        &self.layout
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage 1: one canonical snapshot per raw extract.
    ///
    /// All extracts are parsed before the first snapshot is written; an unreadable
    /// file aborts the stage with nothing written.
    pub fn normalize(&self, ingested_at: NaiveDateTime) -> Result<Vec<SourceReport>, AppError> {
        let inputs = self.layout.list_inputs()?;
        tracing::info!(stage = %Stage::Normalize, inputs = inputs.len(), dir = %self.layout.input_dir.display(), "stage started");
        if inputs.is_empty() {
            tracing::warn!(dir = %self.layout.input_dir.display(), "no raw extracts found");
        }

        let targets = self.snapshot_targets(&inputs)?;

        let normalizer = Normalizer::new(ingested_at.trunc_subsecs(6));
        let sources = inputs
            .iter()
            .map(|path| normalizer.normalize_file(path))
            .collect::<Result<Vec<_>, _>>()?;

        let mut reports = Vec::with_capacity(sources.len());
        let mut written = Vec::with_capacity(sources.len());
        for (target, source) in targets.into_iter().zip(sources) {
            storage::write_table(
                &target,
                &source.table,
                &[(META_SOURCE_KIND, source.kind.as_str().to_string())],
            )?;
            tracing::debug!(file = %source.report.file, snapshot = %target.display(), "snapshot written");
            written.push(target);
            reports.push(source.report);
        }
        self.remove_stale_snapshots(&written)?;

        let rows: usize = reports.iter().map(|r| r.rows_written).sum();
        tracing::info!(stage = %Stage::Normalize, snapshots = reports.len(), rows, "stage completed");
        Ok(reports)
    }

    /// One snapshot path per extract; two extracts sharing a file stem would overwrite each other.
    fn snapshot_targets(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        let mut targets = Vec::with_capacity(inputs.len());
        for input in inputs {
            let target = self.layout.snapshot_path(input);
            if let Some(first) = claimed.insert(target.clone(), input.as_path()) {
                let mut err = AppError::new(
                    ErrorCategory::ValidationError,
                    format!(
                        "Extracts {} and {} both map to snapshot {}",
                        first.display(),
                        input.display(),
                        target.display()
                    ),
                )
                .with_code("NORM-005")
                .with_suggestion("Give every extract in the input directory a distinct file stem");
                err.add_context("snapshot", &target.display().to_string());
                return Err(err);
            }
            targets.push(target);
        }
        Ok(targets)
    }

    /// Snapshots are recreated every run; one whose extract was not delivered this time goes.
    fn remove_stale_snapshots(&self, written: &[PathBuf]) -> Result<(), AppError> {
        if !self.layout.canonical_dir.is_dir() {
            return Ok(());
        }
        for path in self.layout.list_snapshots()? {
            if !written.contains(&path) {
                std::fs::remove_file(&path)?;
                tracing::debug!(snapshot = %path.display(), "stale snapshot removed");
            }
        }
        Ok(())
    }

    /// Stage 2: rebuild every dimension from the canonical snapshots
    pub fn build_dimensions(&self) -> Result<Vec<DimensionReport>, AppError> {
        tracing::info!(stage = %Stage::Dimensions, "stage started");
        let snapshots = SnapshotSet::load(&self.layout)?;
        let builder = DimensionBuilder::new(&self.config.keys, self.config.dimensions.clone());
        let built = builder.build_all(&snapshots)?;

        let mut reports = Vec::with_capacity(built.len());
        for dimension in built {
            storage::write_table(
                &self.layout.gold_path(dimension.table),
                &dimension.data,
                &[(META_TABLE, dimension.table.to_string())],
            )?;
            tracing::debug!(table = %dimension.table, members = dimension.report.members, "dimension written");
            reports.push(dimension.report);
        }

        let collisions: usize = reports.iter().map(|r| r.collisions.len()).sum();
        tracing::info!(stage = %Stage::Dimensions, tables = reports.len(), collisions, "stage completed");
        Ok(reports)
    }

    /// Stage 3: resolve keys against the current dimensions and append new partitions
    pub fn build_facts(&self) -> Result<Vec<FactReport>, AppError> {
        tracing::info!(stage = %Stage::Facts, "stage started");
        let snapshots = SnapshotSet::load(&self.layout)?;
        for kind in FactKind::ALL {
            snapshots.require(kind.source())?;
        }
        let index = self.load_dimension_index()?;
        let builder = FactBuilder::new(self.config.dimensions.clone(), &self.config.facts, &index);

        let mut merged = Vec::with_capacity(FactKind::ALL.len());
        for kind in FactKind::ALL {
            let snapshot = snapshots.require(kind.source())?;
            let built = builder.build(kind, snapshot);
            let path = self.layout.gold_path(kind.table());
            let existing = if path.exists() {
                Some(storage::read_table(&path)?.table)
            } else {
                None
            };
            let had_store = existing.is_some();
            let outcome = merge_partitions(existing, built.data).map_err(|mut e| {
                e.add_context("table", kind.table().as_str());
                e
            })?;

            let mut report = built.report;
            report.partitions_already_loaded = outcome.partitions_already_loaded;
            report.partitions_appended = outcome.partitions_appended;
            report.rows_appended = outcome.rows_appended;
            report.rows_total = outcome.table.len();
            merged.push((kind, had_store, outcome.table, report));
        }

        let mut reports = Vec::with_capacity(merged.len());
        for (kind, had_store, table, report) in merged {
            if had_store && report.rows_appended == 0 {
                tracing::debug!(table = %kind.table(), "no new partitions, store left untouched");
            } else {
                storage::write_table(
                    &self.layout.gold_path(kind.table()),
                    &table,
                    &[(META_TABLE, kind.table().to_string())],
                )?;
            }
            tracing::info!(
                table = %kind.table(),
                partitions_appended = report.partitions_appended,
                partitions_skipped = report.partitions_already_loaded,
                rows_appended = report.rows_appended,
                rows_total = report.rows_total,
                "fact merged"
            );
            reports.push(report);
        }

        tracing::info!(stage = %Stage::Facts, tables = reports.len(), "stage completed");
        Ok(reports)
    }

    fn load_dimension_index(&self) -> Result<DimensionIndex, AppError> {
        let mut index = DimensionIndex::default().with_dates(&self.read_dimension(GoldTable::DimDate)?)?;
        for kind in DimensionKind::ALL {
            index = index.with_entity(kind, &self.read_dimension(kind.table())?)?;
        }
        Ok(index)
    }

    fn read_dimension(&self, table: GoldTable) -> Result<Table, AppError> {
        let path = self.layout.gold_path(table);
        if !path.exists() {
            return Err(AppError::new(
                ErrorCategory::MissingInput,
                format!("Dimension {} not found at {}", table, path.display()),
            )
            .with_code("FACT-001")
            .with_suggestion("Build dimensions first with `transit-star dimensions`"));
        }
        Ok(storage::read_table(&path)?.table)
    }

    /// All three stages. The report is persisted when `run.write_report` is set.
    pub fn run(&self) -> Result<RunReport, AppError> {
        let mut report = RunReport::new(Utc::now());
        tracing::info!(run_id = %report.run_id, root = %self.layout.root.display(), "run started");

        report.normalize = self
            .normalize(report.started_at.naive_utc())
            .map_err(|e| e.with_stage(Stage::Normalize))?;
        report.dimensions = self
            .build_dimensions()
            .map_err(|e| e.with_stage(Stage::Dimensions))?;
        report.facts = self
            .build_facts()
            .map_err(|e| e.with_stage(Stage::Facts))?;
        report.finish();

        if self.config.run.write_report {
            let path = report.save(&self.layout.runs_dir())?;
            tracing::info!(path = %path.display(), "run report written");
        }
        tracing::info!(run_id = %report.run_id, collisions = report.collision_count(), "run completed");
        Ok(report)
    }

    /// Row counts of every gold table; facts also report their loaded partitions
    pub fn status(&self) -> Result<Vec<TableStatus>, AppError> {
        GoldTable::ALL
            .iter()
            .map(|table| {
                let path = self.layout.gold_path(*table);
                if !path.exists() {
                    return Ok(TableStatus {
                        table: *table,
                        present: false,
                        rows: 0,
                        partitions: None,
                    });
                }
                let stored = storage::read_table(&path)?;
                Ok(TableStatus {
                    table: *table,
                    present: true,
                    rows: stored.table.len(),
                    partitions: table.is_fact().then(|| PartitionSummary::of(&stored.table)),
                })
            })
            .collect()
    }
}
