pub mod config;
pub mod context;
pub mod layers;

pub use context::{detect_context, ExecutionContext};
pub use layers::console::ConsoleOutput;

use crate::core::config::loader::CONFIG_FILE_NAME;
use crate::logging::config::LoggingConfig;
use crate::logging::layers::{console, file, BoxLayer};
use crate::{cli::Command, Result};
use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::registry::Registry;

type Filtered = Layered<EnvFilter, Registry>;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guards that keep logging sinks active for the duration of the command.
pub struct LoggingGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    console_output: ConsoleOutput,
    log_file_path: PathBuf,
}

impl LoggingGuard {
    /// Returns the console output configuration used during initialization.
    pub fn console_output(&self) -> ConsoleOutput {
        self.console_output
    }

    /// Returns the log file path backed by the file sink.
    pub fn log_file_path(&self) -> &Path {
        &self.log_file_path
    }
}

/// Initialize the logging framework for the provided CLI command.
///
/// The `[logging]` section is read from the same file the pipeline config comes from.
/// `RUST_LOG` takes precedence over the configured level. Errors when invoked more
/// than once per process.
pub fn init(command: &Command) -> Result<LoggingGuard> {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(anyhow!("logging already initialized"));
    }

    let context = detect_context();
    let workspace = command.workspace();
    let config_file = workspace
        .config
        .clone()
        .unwrap_or_else(|| workspace.path.join(CONFIG_FILE_NAME));
    let config = LoggingConfig::load(Some(&config_file))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_level))
        .context("failed to configure tracing level")?;
    let log_file_path = file::log_file_path(&config, Some(&workspace.path))?;

    let mut layers: Vec<BoxLayer<Filtered>> = Vec::new();
    let mut file_guard = None;
    if let Some((layer, guard)) = file::file_layer::<Filtered>(&log_file_path, &config)? {
        layers.push(layer);
        file_guard = Some(guard);
    }

    let console_output = console::select_console_output(context, config.console_output);
    if let Some(layer) = console::console_layer::<Filtered>(console_output) {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        console_output,
        log_file_path,
    })
}
