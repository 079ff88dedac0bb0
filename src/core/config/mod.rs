use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use transit_star_types::CanonicalRule;

/// Pipeline configuration loaded from transit.toml
///
/// Resolved once per invocation and passed by value into each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Surrogate key minting
    #[serde(default)]
    pub keys: KeysConfig,

    /// Canonicalization rule per entity dimension
    #[serde(default)]
    pub dimensions: DimensionRules,

    /// Projection list per fact type
    #[serde(default)]
    pub facts: FactsConfig,

    /// Run-level options
    #[serde(default)]
    pub run: RunConfig,
}

/// Directory layout, relative paths resolve against the workspace root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw extracts supplied by the upstream downloader
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// One canonical snapshot per source
    #[serde(default = "default_canonical_dir")]
    pub canonical_dir: PathBuf,

    /// Dimension and fact tables
    #[serde(default = "default_gold_dir")]
    pub gold_dir: PathBuf,
}

/// Surrogate key configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Modulus applied to the natural-key digest
    #[serde(default = "default_key_space")]
    pub key_space: u64,

    /// Abort the run when two natural keys mint the same surrogate key
    #[serde(default)]
    pub fail_on_collision: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionRules {
    #[serde(default = "default_numeric_rule")]
    pub line: CanonicalRule,

    #[serde(default = "default_numeric_rule")]
    pub franchise: CanonicalRule,

    #[serde(default = "default_text_rule")]
    pub company: CanonicalRule,

    #[serde(default = "default_numeric_rule")]
    pub vehicle: CanonicalRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactsConfig {
    #[serde(default = "default_trip_projection")]
    pub trip: FactProjection,

    #[serde(default = "default_vehicle_event_projection")]
    pub vehicle_event: FactProjection,
}

/// Measure columns carried into a fact table, in output order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactProjection {
    pub measures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Persist a JSON run report under the gold directory
    #[serde(default = "default_write_report")]
    pub write_report: bool,
}

// Default functions
fn default_input_dir() -> PathBuf {
    PathBuf::from("data/bronze")
}

fn default_canonical_dir() -> PathBuf {
    PathBuf::from("data/silver")
}

fn default_gold_dir() -> PathBuf {
    PathBuf::from("data/gold")
}

fn default_key_space() -> u64 {
    100_000_000
}

fn default_numeric_rule() -> CanonicalRule {
    CanonicalRule::Numeric
}

fn default_text_rule() -> CanonicalRule {
    CanonicalRule::Text
}

fn default_write_report() -> bool {
    true
}

fn measures(names: &[&str]) -> FactProjection {
    FactProjection {
        measures: names.iter().map(|name| name.to_string()).collect(),
    }
}

fn default_trip_projection() -> FactProjection {
    measures(&[
        "subline_code",
        "control_point",
        "departure_time",
        "arrival_time",
        "turnstile_departure",
        "turnstile_arrival",
        "occurrence_flag",
        "justification_flag",
        "day_type",
        "trip_length",
        "mechanical_failure_flag",
        "unsafe_event_flag",
        "closing_flag",
        "closing_date",
        "total_passengers",
    ])
}

fn default_vehicle_event_projection() -> FactProjection {
    measures(&[
        "event_code",
        "event_time",
        "latitude",
        "longitude",
        "speed",
        "heading",
        "direction",
        "distance_travelled",
    ])
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            input_dir: default_input_dir(),
            canonical_dir: default_canonical_dir(),
            gold_dir: default_gold_dir(),
        }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            key_space: default_key_space(),
            fail_on_collision: false,
        }
    }
}

impl Default for DimensionRules {
    fn default() -> Self {
        DimensionRules {
            line: default_numeric_rule(),
            franchise: default_numeric_rule(),
            company: default_text_rule(),
            vehicle: default_numeric_rule(),
        }
    }
}

impl Default for FactsConfig {
    fn default() -> Self {
        FactsConfig {
            trip: default_trip_projection(),
            vehicle_event: default_vehicle_event_projection(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            write_report: default_write_report(),
        }
    }
}


pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;
