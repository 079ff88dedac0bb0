#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::keys::KeyCollision;
use crate::core::normalize::Delimiter;
use crate::core::types::ErrorCategory;
use crate::utils::{FileSerializer, FileUtils, JsonSerializer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use transit_star_types::SourceKind;

/// Outcome of normalizing one raw extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub file: String,
    pub kind: SourceKind,
    pub delimiter: Delimiter,
    pub rows_read: usize,
    pub rows_written: usize,
    pub empty_columns_dropped: Vec<String>,
    pub empty_rows_dropped: usize,
    pub duplicate_rows_dropped: usize,
    /// Cells per column that failed coercion and became null
    pub coercion_nulls: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub table: String,
    pub members: usize,
    pub collisions: Vec<KeyCollision>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactReport {
    pub table: String,
    pub rows_built: usize,
    pub rows_outside_date_dimension: usize,
    /// Rows per key column whose natural key did not resolve
    pub unresolved_keys: BTreeMap<String, usize>,
    pub partitions_already_loaded: usize,
    pub partitions_appended: usize,
    pub rows_appended: usize,
    pub rows_total: usize,
}

/// Everything one invocation did, persisted under `<gold>/_runs/<run_id>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub normalize: Vec<SourceReport>,
    #[serde(default)]
    pub dimensions: Vec<DimensionReport>,
    #[serde(default)]
    pub facts: Vec<FactReport>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        RunReport {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            finished_at: None,
            normalize: Vec::new(),
            dimensions: Vec::new(),
            facts: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn collision_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.collisions.len()).sum()
    }

    pub fn to_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            AppError::new(
                ErrorCategory::SerializationError,
                format!("Failed to serialize run report: {}", e),
            )
            .with_code("RUN-002")
        })
    }

    /// Persist as `<runs_dir>/<run_id>.json`
    pub fn save(&self, runs_dir: &Path) -> Result<PathBuf, AppError> {
        let path = runs_dir.join(format!("{}.json", self.run_id));
        FileUtils
            .save_to_file(&path, self, &JsonSerializer::pretty())
            .map_err(|e| {
                AppError::from(e)
                    .with_code("RUN-003")
                    .with_suggestion("Check that the gold directory is writable")
            })?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        FileUtils
            .load_from_file(path, &JsonSerializer::default())
            .map_err(|e| AppError::from(e).with_code("RUN-004"))
    }

    /// Most recent report in `runs_dir`, by start time
    pub fn latest(runs_dir: &Path) -> Result<Option<Self>, AppError> {
        if !runs_dir.is_dir() {
            return Ok(None);
        }
        let mut latest: Option<RunReport> = None;
        for entry in std::fs::read_dir(runs_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let report = Self::load(&path)?;
            if latest
                .as_ref()
                .map_or(true, |current| report.started_at > current.started_at)
            {
                latest = Some(report);
            }
        }
        Ok(latest)
    }

    /// Aligned plain-text rendering for the console
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run {}", self.run_id);
        let _ = writeln!(out, "  started:  {}", self.started_at.to_rfc3339());
        if let Some(finished) = self.finished_at {
            let _ = writeln!(out, "  finished: {}", finished.to_rfc3339());
        }

        if !self.normalize.is_empty() {
            let _ = writeln!(out, "\nNormalize");
            for s in &self.normalize {
                let nulls: usize = s.coercion_nulls.values().sum();
                let _ = writeln!(
                    out,
                    "  {:<32} {:<16} {:<9} read {:>8}  written {:>8}  empty {:>6}  dup {:>6}  nulls {:>6}",
                    s.file,
                    s.kind.as_str(),
                    s.delimiter.name(),
                    s.rows_read,
                    s.rows_written,
                    s.empty_rows_dropped,
                    s.duplicate_rows_dropped,
                    nulls
                );
            }
        }

        if !self.dimensions.is_empty() {
            let _ = writeln!(out, "\nDimensions");
            for d in &self.dimensions {
                let _ = writeln!(
                    out,
                    "  {:<20} members {:>8}  collisions {:>4}",
                    d.table,
                    d.members,
                    d.collisions.len()
                );
                for c in &d.collisions {
                    let _ = writeln!(out, "    key {} <- {}", c.key, c.natural_keys.join(", "));
                }
            }
        }

        if !self.facts.is_empty() {
            let _ = writeln!(out, "\nFacts");
            for f in &self.facts {
                let unresolved: usize = f.unresolved_keys.values().sum();
                let _ = writeln!(
                    out,
                    "  {:<20} built {:>8}  outside dates {:>6}  unresolved {:>6}  partitions +{} (skipped {})  rows +{} = {}",
                    f.table,
                    f.rows_built,
                    f.rows_outside_date_dimension,
                    unresolved,
                    f.partitions_appended,
                    f.partitions_already_loaded,
                    f.rows_appended,
                    f.rows_total
                );
            }
        }

        out
    }
}
