use crate::core::config::loader::CONFIG_FILE_NAME;
use crate::logging::layers::console::ConsoleOutput;
use crate::logging::layers::file::FileFormat;
use crate::Result;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::Directive;

const DEFAULT_LEVEL: &str = "info";

/// Resolved logging configuration after reading the workspace config and env overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
    pub default_level: String,
    pub enable_file: bool,
    pub file_format: FileFormat,
    pub console_output: Option<ConsoleOutput>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_level: DEFAULT_LEVEL.to_string(),
            enable_file: true,
            file_format: FileFormat::Text,
            console_output: None,
        }
    }
}

impl LoggingConfig {
    /// Load configuration with deterministic precedence: defaults, config file, env overrides.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = LoggingConfig::default();
        if let Some(path) = config_file {
            if let Some(section) = Self::load_from_file(path)? {
                config.apply(section);
            }
        }
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `[logging]` section of `<workspace>/transit.toml`
    pub fn load_from_workspace(workspace_root: &Path) -> Result<Self> {
        Self::load(Some(&workspace_root.join(CONFIG_FILE_NAME)))
    }

    fn load_from_file(path: &Path) -> Result<Option<TomlLoggingSection>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read logging config {}", path.display()))?;
        let parsed: TomlLogging = toml::from_str(&content)
            .with_context(|| format!("failed to parse logging config {}", path.display()))?;
        Ok(parsed.logging)
    }

    fn apply(&mut self, logging: TomlLoggingSection) {
        if let Some(log_dir) = logging.log_dir {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
        if let Some(default_level) = logging.default_level {
            self.default_level = default_level;
        }
        if let Some(enable_file) = logging.enable_file {
            self.enable_file = enable_file;
        }
        if let Some(file_format) = logging.file_format {
            self.file_format = file_format;
        }
        if let Some(console_output) = logging.console_output {
            self.console_output = Some(console_output);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("TRANSIT_LOG_DIR") {
            if !dir.trim().is_empty() {
                self.log_dir = Some(PathBuf::from(dir));
            }
        }
    }

    fn validate(&self) -> Result<()> {
        Directive::from_str(&self.default_level)
            .map_err(|_| anyhow!("logging.default_level must be a valid tracing directive"))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TomlLogging {
    pub logging: Option<TomlLoggingSection>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingSection {
    pub log_dir: Option<String>,
    pub default_level: Option<String>,
    pub enable_file: Option<bool>,
    pub file_format: Option<FileFormat>,
    #[serde(default)]
    pub console_output: Option<ConsoleOutput>,
}
