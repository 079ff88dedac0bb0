//! Columnar persistence for snapshots and gold tables.
//!
//! Every table is one Parquet file written in a single row group. Writes go to a
//! sibling `.tmp` file that is renamed over the target, so a crashed run never leaves
//! a half-written snapshot, dimension or fact store behind.

mod convert;

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use transit_star_types::Table;

pub use convert::{data_type_for, table_from_batches, table_to_batch};

/// Source kind tag stamped on canonical snapshots
pub const META_SOURCE_KIND: &str = "transit.source_kind";
/// Gold table name stamped on dimension and fact files
pub const META_TABLE: &str = "transit.table";
pub const META_CREATED_BY: &str = "created_by";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parquet error on {}: {source}", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },
    #[error("Cannot store a table without columns")]
    EmptySchema,
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parquet(path: &Path, source: parquet::errors::ParquetError) -> Self {
        StorageError::Parquet {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "STORE-001",
            StorageError::Parquet { .. } => "STORE-002",
            StorageError::Arrow(_) => "STORE-003",
            StorageError::UnsupportedType { .. } => "STORE-004",
            StorageError::EmptySchema => "STORE-005",
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        let category = match e {
            StorageError::UnsupportedType { .. } | StorageError::EmptySchema => {
                ErrorCategory::SchemaError
            }
            _ => ErrorCategory::StorageError,
        };
        let code = e.code();
        let message = e.to_string();
        AppError::with_source(category, message, Box::new(e)).with_code(code)
    }
}

/// A table read back from disk together with its file-level metadata
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub table: Table,
    pub metadata: HashMap<String, String>,
}

fn writer_properties(metadata: &[(&str, String)]) -> WriterProperties {
    let mut kv = vec![KeyValue {
        key: META_CREATED_BY.to_string(),
        value: Some(format!("transit-star {}", crate::VERSION)),
    }];
    kv.extend(metadata.iter().map(|(key, value)| KeyValue {
        key: key.to_string(),
        value: Some(value.clone()),
    }));
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .set_key_value_metadata(Some(kv))
        .build()
}

/// Write `table` to `path`, replacing any existing file atomically
pub fn write_table(
    path: &Path,
    table: &Table,
    metadata: &[(&str, String)],
) -> Result<(), StorageError> {
    let batch = table_to_batch(table)?;
    let tmp_path = path.with_extension("tmp");
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let written = (|| {
        let file = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(writer_properties(metadata)))
            .map_err(|e| StorageError::parquet(&tmp_path, e))?;
        writer
            .write(&batch)
            .map_err(|e| StorageError::parquet(&tmp_path, e))?;
        writer
            .close()
            .map_err(|e| StorageError::parquet(&tmp_path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))
    })();

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written?;

    tracing::debug!(path = %path.display(), rows = table.len(), "table written");
    Ok(())
}

/// Read a whole table and its key-value metadata
pub fn read_table(path: &Path) -> Result<StoredTable, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| StorageError::parquet(path, e))?;

    let metadata = collect_metadata(builder.metadata().file_metadata().key_value_metadata());
    let schema = builder.schema().clone();
    let reader = builder.build().map_err(|e| StorageError::parquet(path, e))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }

    let table = table_from_batches(&schema, &batches)?;
    Ok(StoredTable { table, metadata })
}

/// Read only the key-value metadata of a stored table
pub fn read_metadata(path: &Path) -> Result<HashMap<String, String>, StorageError> {
    let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| StorageError::parquet(path, e))?;
    Ok(collect_metadata(
        builder.metadata().file_metadata().key_value_metadata(),
    ))
}

fn collect_metadata(kv: Option<&Vec<KeyValue>>) -> HashMap<String, String> {
    kv.map(|pairs| {
        pairs
            .iter()
            .filter_map(|pair| pair.value.as_ref().map(|v| (pair.key.clone(), v.clone())))
            .collect()
    })
    .unwrap_or_default()
}
