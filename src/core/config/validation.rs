#![allow(clippy::result_large_err)]

use super::{FactProjection, PipelineConfig};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use regex::Regex;
use std::collections::HashSet;

/// Measures name canonical snapshot columns, which are always snake_case
const MEASURE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Fact columns the builder emits itself
const RESERVED_COLUMNS: &[&str] = &[
    "date_key",
    "line_key",
    "franchise_key",
    "company_key",
    "vehicle_key",
    "ingested_at",
];

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &PipelineConfig) -> Result<(), AppError> {
        if config.keys.key_space < 2 {
            return Err(invalid("keys.key_space must be at least 2"));
        }

        for (name, path) in [
            ("paths.input_dir", &config.paths.input_dir),
            ("paths.canonical_dir", &config.paths.canonical_dir),
            ("paths.gold_dir", &config.paths.gold_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(invalid(format!("{} cannot be empty", name)));
            }
        }

        if config.paths.canonical_dir == config.paths.gold_dir {
            return Err(invalid(
                "paths.canonical_dir and paths.gold_dir must be different directories",
            ));
        }

        Self::validate_projection("facts.trip", &config.facts.trip)?;
        Self::validate_projection("facts.vehicle_event", &config.facts.vehicle_event)?;

        Ok(())
    }

    fn validate_projection(name: &str, projection: &FactProjection) -> Result<(), AppError> {
        if projection.measures.is_empty() {
            return Err(invalid(format!("{}.measures cannot be empty", name)));
        }
        let pattern = Regex::new(MEASURE_NAME_PATTERN).map_err(|e| {
            AppError::new(
                ErrorCategory::InternalError,
                format!("measure name pattern does not compile: {}", e),
            )
        })?;
        let mut seen = HashSet::new();
        for measure in &projection.measures {
            if measure.trim().is_empty() {
                return Err(invalid(format!("{}.measures contains a blank name", name)));
            }
            if !pattern.is_match(measure) {
                return Err(invalid(format!(
                    "{}.measures entry '{}' is not a canonical column name",
                    name, measure
                )));
            }
            if RESERVED_COLUMNS.contains(&measure.as_str()) {
                return Err(invalid(format!(
                    "{}.measures cannot include the reserved column '{}'",
                    name, measure
                )));
            }
            if !seen.insert(measure.as_str()) {
                return Err(invalid(format!(
                    "{}.measures lists '{}' more than once",
                    name, measure
                )));
            }
        }
        Ok(())
    }
}

fn invalid<T: Into<String>>(message: T) -> AppError {
    AppError::new(ErrorCategory::ValidationError, message).with_code("CFG-004")
}
