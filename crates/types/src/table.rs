use crate::value::{ColumnType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Row-major in-memory table with named columns.
///
/// Every row always has exactly one cell per column; rows pushed short are padded
/// with nulls and rows pushed long are truncated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Cells of the named column, in row order.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn column_type(&self, idx: usize) -> ColumnType {
        ColumnType::infer(self.rows.iter().map(|row| &row[idx]))
    }

    pub fn rename_column(&mut self, idx: usize, name: impl Into<String>) {
        if let Some(slot) = self.columns.get_mut(idx) {
            *slot = name.into();
        }
    }

    /// Append a column; `values` shorter than the table are padded with nulls.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        self.columns.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
    }

    /// Apply `f` to every cell of the named column. Returns `false` if the column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Remove columns whose every cell is null or blank; returns the removed names.
    pub fn drop_empty_columns(&mut self) -> Vec<String> {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|idx| self.rows.iter().any(|row| !row[idx].is_null()))
            .collect();
        let dropped: Vec<String> = self
            .columns
            .iter()
            .zip(keep.iter())
            .filter(|(_, keep)| !**keep)
            .map(|(name, _)| name.clone())
            .collect();
        if dropped.is_empty() {
            return dropped;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        dropped
    }

    /// Keep rows for which `predicate` returns `true`; returns how many were removed.
    pub fn retain_rows<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&[Value]) -> bool,
    {
        let before = self.rows.len();
        self.rows.retain(|row| predicate(row));
        before - self.rows.len()
    }

    /// Remove exact-duplicate rows, keeping first occurrences in order.
    pub fn dedup_rows(&mut self) -> usize {
        let mut seen: HashSet<Vec<Value>> = HashSet::with_capacity(self.rows.len());
        self.retain_rows(|row| seen.insert(row.to_vec()))
    }

    /// Project onto `names`; absent columns come back as all-null.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Table {
        let indices: Vec<Option<usize>> = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect();
        let rows = self.rows.iter().map(|row| {
            indices
                .iter()
                .map(|idx| idx.map(|i| row[i].clone()).unwrap_or_default())
                .collect()
        });
        Table::with_rows(names.iter().map(|n| n.as_ref().to_string()), rows)
    }

    /// Append `other`'s rows, aligning cells by column name. Columns only present in
    /// `other` are added to `self` and back-filled with nulls.
    pub fn append(&mut self, other: Table) {
        for name in &other.columns {
            if !self.has_column(name) {
                self.push_column(name.clone(), Vec::new());
            }
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        for row in other.rows {
            let mut aligned = vec![Value::Null; self.columns.len()];
            for (cell, target) in row.into_iter().zip(mapping.iter()) {
                aligned[*target] = cell;
            }
            self.rows.push(aligned);
        }
    }
}

fn retain_by_mask<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep.iter())
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect()
}
