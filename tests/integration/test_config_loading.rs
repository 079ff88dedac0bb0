use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use transit_star::core::config::{ConfigLoader, ConfigValidator};
use transit_star::core::types::ErrorCategory;
use transit_star::core::{Pipeline, PipelineConfig};
use transit_star_types::CanonicalRule;

fn clear_transit_env() {
    for v in &[
        "TRANSIT_INPUT_DIR",
        "TRANSIT_CANONICAL_DIR",
        "TRANSIT_GOLD_DIR",
        "TRANSIT_KEY_SPACE",
        "TRANSIT_FAIL_ON_COLLISION",
    ] {
        env::remove_var(v);
    }
}

/// Test integration of config loading with environment variables
#[test]
#[serial]
fn test_config_loading_integration() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    let workspace_path = temp_dir.path();

    let config_content = r#"
[paths]
input_dir = "landing"
gold_dir = "/srv/warehouse/gold"

[keys]
key_space = 1000003

[dimensions]
company = "numeric"
line = "text"

[facts.vehicle_event]
measures = ["latitude", "longitude"]

[run]
write_report = false

[logging]
default_level = "debug"
"#;
    fs::write(workspace_path.join("transit.toml"), config_content).unwrap();

    let config = ConfigLoader::load_from_workspace(workspace_path).unwrap();
    ConfigValidator::validate(&config).unwrap();

    assert_eq!(config.paths.input_dir, PathBuf::from("landing"));
    assert_eq!(config.paths.canonical_dir, PathBuf::from("data/silver"));
    assert_eq!(config.keys.key_space, 1_000_003);
    assert!(!config.keys.fail_on_collision);
    assert_eq!(config.dimensions.company, CanonicalRule::Numeric);
    assert_eq!(config.dimensions.line, CanonicalRule::Text);
    assert_eq!(config.dimensions.vehicle, CanonicalRule::Numeric);
    assert_eq!(config.facts.vehicle_event.measures, vec!["latitude", "longitude"]);
    assert_eq!(config.facts.trip, PipelineConfig::default().facts.trip);
    assert!(!config.run.write_report);

    let pipeline = Pipeline::new(workspace_path, config);
    assert_eq!(pipeline.layout().input_dir, workspace_path.join("landing"));
    assert_eq!(pipeline.layout().gold_dir, PathBuf::from("/srv/warehouse/gold"));
}

#[test]
#[serial]
fn test_env_overrides_take_precedence() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("transit.toml"),
        "[keys]\nkey_space = 500\nfail_on_collision = false\n",
    )
    .unwrap();

    env::set_var("TRANSIT_KEY_SPACE", "9999");
    env::set_var("TRANSIT_FAIL_ON_COLLISION", "true");
    env::set_var("TRANSIT_GOLD_DIR", "out/gold");
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    clear_transit_env();

    assert_eq!(config.keys.key_space, 9999);
    assert!(config.keys.fail_on_collision);
    assert_eq!(config.paths.gold_dir, PathBuf::from("out/gold"));
}

#[test]
#[serial]
fn test_unparseable_override_is_ignored() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    env::set_var("TRANSIT_KEY_SPACE", "lots");
    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    clear_transit_env();

    assert_eq!(config.keys.key_space, 100_000_000);
}

#[test]
#[serial]
fn test_invalid_config_is_rejected() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("transit.toml"),
        "[paths]\ncanonical_dir = \"data/gold\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap();
    let err = ConfigValidator::validate(&config).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
}

#[test]
#[serial]
fn test_malformed_toml_is_a_config_error() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("transit.toml"), "[keys\nkey_space = ").unwrap();

    let err = ConfigLoader::load_from_workspace(temp_dir.path()).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ConfigError);
    assert_eq!(err.code, "CFG-003");
}

#[test]
#[serial]
fn test_explicit_config_must_exist() {
    clear_transit_env();
    let temp_dir = TempDir::new().unwrap();
    let err = ConfigLoader::load_explicit(&temp_dir.path().join("missing.toml")).unwrap_err();
    assert_eq!(err.code, "CFG-001");
}
