#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::layout::WarehouseLayout;
use crate::core::storage::{self, META_SOURCE_KIND};
use crate::core::types::ErrorCategory;
use std::collections::BTreeMap;
use transit_star_types::{SourceKind, Table};

/// Canonical snapshots grouped by their source kind tag.
///
/// Several snapshots of one kind are unioned in file-name order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    tables: BTreeMap<SourceKind, Table>,
}

impl SnapshotSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every snapshot in the canonical directory, dispatching on the stored tag
    pub fn load(layout: &WarehouseLayout) -> Result<Self, AppError> {
        let mut set = SnapshotSet::new();
        for path in layout.list_snapshots()? {
            let stored = storage::read_table(&path)?;
            let kind = match stored.metadata.get(META_SOURCE_KIND).map(|k| k.parse()) {
                Some(Ok(kind)) => kind,
                _ => {
                    tracing::warn!(path = %path.display(), "snapshot has no source kind tag, skipping");
                    continue;
                }
            };
            tracing::debug!(path = %path.display(), kind = %kind, rows = stored.table.len(), "snapshot loaded");
            set.insert(kind, stored.table);
        }
        Ok(set)
    }

    pub fn insert(&mut self, kind: SourceKind, table: Table) {
        match self.tables.get_mut(&kind) {
            Some(existing) => existing.append(table),
            None => {
                self.tables.insert(kind, table);
            }
        }
    }

    pub fn get(&self, kind: SourceKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    /// Snapshot of a kind the current stage cannot run without
    pub fn require(&self, kind: SourceKind) -> Result<&Table, AppError> {
        self.get(kind).ok_or_else(|| {
            AppError::new(
                ErrorCategory::MissingInput,
                format!("No {} snapshot in the canonical directory", kind),
            )
            .with_code("RUN-005")
            .with_suggestion("Check that the upstream extract was delivered and rerun `transit-star normalize`")
        })
    }
}
