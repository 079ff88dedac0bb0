#![allow(clippy::result_large_err)]

use crate::core::config::PathsConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Gold tables produced by the dimension and fact stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoldTable {
    DimDate,
    DimLine,
    DimFranchise,
    DimCompany,
    DimVehicle,
    FactTrip,
    FactVehicleEvent,
}

impl GoldTable {
    pub const ALL: [GoldTable; 7] = [
        GoldTable::DimDate,
        GoldTable::DimLine,
        GoldTable::DimFranchise,
        GoldTable::DimCompany,
        GoldTable::DimVehicle,
        GoldTable::FactTrip,
        GoldTable::FactVehicleEvent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GoldTable::DimDate => "dim_date",
            GoldTable::DimLine => "dim_line",
            GoldTable::DimFranchise => "dim_franchise",
            GoldTable::DimCompany => "dim_company",
            GoldTable::DimVehicle => "dim_vehicle",
            GoldTable::FactTrip => "fact_trip",
            GoldTable::FactVehicleEvent => "fact_vehicle_event",
        }
    }

    pub fn is_fact(self) -> bool {
        matches!(self, GoldTable::FactTrip | GoldTable::FactVehicleEvent)
    }

    pub fn file_name(self) -> String {
        format!("{}.parquet", self.as_str())
    }
}

impl fmt::Display for GoldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Absolute directory layout of one warehouse, resolved against the workspace root
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseLayout {
    pub root: PathBuf,
    pub input_dir: PathBuf,
    pub canonical_dir: PathBuf,
    pub gold_dir: PathBuf,
}

impl WarehouseLayout {
    pub fn resolve(root: &Path, paths: &PathsConfig) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        WarehouseLayout {
            root: root.to_path_buf(),
            input_dir: join(&paths.input_dir),
            canonical_dir: join(&paths.canonical_dir),
            gold_dir: join(&paths.gold_dir),
        }
    }

    /// Snapshot path for a raw extract: `<canonical_dir>/<stem>.parquet`
    pub fn snapshot_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        self.canonical_dir.join(format!("{}.parquet", stem))
    }

    pub fn gold_path(&self, table: GoldTable) -> PathBuf {
        self.gold_dir.join(table.file_name())
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.gold_dir.join("_runs")
    }

    /// Raw extracts in the input directory, sorted by file name
    pub fn list_inputs(&self) -> Result<Vec<PathBuf>, AppError> {
        list_files(&self.input_dir, &["csv", "txt"]).map_err(|e| {
            e.with_code("NORM-001")
                .with_suggestion("Make sure the upstream downloader populated the input directory")
        })
    }

    /// Canonical snapshots in the canonical directory, sorted by file name
    pub fn list_snapshots(&self) -> Result<Vec<PathBuf>, AppError> {
        list_files(&self.canonical_dir, &["parquet"])
            .map_err(|e| e.with_code("RUN-001").with_suggestion("Run `transit-star normalize` first"))
    }
}

fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new(
            ErrorCategory::MissingInput,
            format!("Cannot read directory {}: {}", dir.display(), e),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
            .unwrap_or(false);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
