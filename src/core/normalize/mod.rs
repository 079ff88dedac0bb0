//! Schema normalizer: one raw extract in, one canonical typed snapshot out.
//!
//! The source kind is decided here, once, from the header signature and stamped
//! on the snapshot. Later stages dispatch on that tag and never look at raw headers.

#![allow(clippy::result_large_err)]

pub mod coerce;
pub mod delimiter;
pub mod vocabulary;

pub use coerce::Coercion;
pub use delimiter::Delimiter;

use crate::core::error::AppError;
use crate::core::report::SourceReport;
use crate::core::types::ErrorCategory;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use transit_star_types::{SourceKind, Table, Value};

/// A raw extract parsed into text cells, before any typing
#[derive(Debug, Clone)]
pub struct RawExtract {
    pub delimiter: Delimiter,
    pub table: Table,
}

/// Canonical snapshot of one source plus what happened while building it
#[derive(Debug, Clone)]
pub struct NormalizedSource {
    pub kind: SourceKind,
    pub table: Table,
    pub report: SourceReport,
}

/// Decode bytes as UTF-8, falling back to Latin-1
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Parse delimited text with a sniffed delimiter. Cells are trimmed and blanks become null.
pub fn parse_extract(text: &str) -> Result<RawExtract, AppError> {
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = Delimiter::sniff(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            "Extract has no header row",
        )
        .with_code("NORM-002"));
    }

    let mut table = Table::new(unique_headers(headers.iter()));
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        table.push_row(
            record
                .iter()
                .map(|cell| {
                    let cell = cell.trim();
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::text(cell)
                    }
                })
                .collect(),
        );
    }

    Ok(RawExtract { delimiter, table })
}

fn csv_error(e: csv::Error) -> AppError {
    AppError::with_source(
        ErrorCategory::ValidationError,
        format!("Malformed delimited text: {}", e),
        Box::new(e),
    )
    .with_code("NORM-003")
}

/// Normalize headers, suffixing repeats (`linha`, `linha_2`) so every name is unique
fn unique_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.enumerate()
        .map(|(idx, header)| {
            let mut name = vocabulary::normalize_header(header);
            if name.is_empty() {
                name = format!("column_{}", idx + 1);
            }
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count > 1 {
                format!("{}_{}", name, count)
            } else {
                name
            }
        })
        .collect()
}

/// Applies the fixed cleaning, renaming and coercion steps to raw extracts
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    ingested_at: NaiveDateTime,
}

impl Normalizer {
    /// `ingested_at` is stamped on every row of every snapshot built by this normalizer
    pub fn new(ingested_at: NaiveDateTime) -> Self {
        Normalizer { ingested_at }
    }

    pub fn normalize_file(&self, path: &Path) -> Result<NormalizedSource, AppError> {
        let bytes = std::fs::read(path).map_err(|e| {
            AppError::new(
                ErrorCategory::MissingInput,
                format!("Cannot read extract {}: {}", path.display(), e),
            )
            .with_code("NORM-004")
        })?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = parse_extract(&decode(&bytes)).map_err(|mut e| {
            e.add_context("file", &file);
            e
        })?;
        Ok(self.normalize_raw(&file, raw))
    }

    pub fn normalize_text(&self, file: &str, text: &str) -> Result<NormalizedSource, AppError> {
        Ok(self.normalize_raw(file, parse_extract(text)?))
    }

    /// Run every step after parsing. Never fails: bad cells become null.
    pub fn normalize_raw(&self, file: &str, raw: RawExtract) -> NormalizedSource {
        let RawExtract {
            delimiter,
            mut table,
        } = raw;
        let rows_read = table.len();

        let empty_columns_dropped = table.drop_empty_columns();
        // Row cleaning sees the raw text; a cell nulled by coercion never costs its row.
        let empty_rows_dropped = table.retain_rows(|row| row.iter().any(|cell| !cell.is_null()));
        let duplicate_rows_dropped = table.dedup_rows();

        let kind = vocabulary::classify(table.columns());

        for idx in 0..table.width() {
            let canonical = vocabulary::canonical_name(kind, &table.columns()[idx]);
            if let Some(canonical) = canonical {
                if !table.has_column(canonical) {
                    table.rename_column(idx, canonical);
                }
            }
        }

        let mut coercion_nulls = BTreeMap::new();
        for (column, coercion) in vocabulary::coercions(kind) {
            let mut failed = 0;
            table.map_column(column, |cell| {
                let coerced = coercion.apply(cell);
                if coerced.is_null() && !cell.is_null() {
                    failed += 1;
                }
                coerced
            });
            if failed > 0 {
                coercion_nulls.insert(column.to_string(), failed);
            }
        }

        let stamp = Value::Timestamp(self.ingested_at);
        table.push_column(vocabulary::INGESTED_AT, vec![stamp; table.len()]);

        let report = SourceReport {
            file: file.to_string(),
            kind,
            delimiter,
            rows_read,
            rows_written: table.len(),
            empty_columns_dropped,
            empty_rows_dropped,
            duplicate_rows_dropped,
            coercion_nulls,
        };

        tracing::debug!(
            file,
            kind = %kind,
            delimiter = %delimiter,
            rows_read,
            rows_written = report.rows_written,
            "extract normalized"
        );

        NormalizedSource {
            kind,
            table,
            report,
        }
    }
}
