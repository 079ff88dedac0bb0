use super::BoxLayer;
use crate::logging::config::LoggingConfig;
use crate::Result;
use anyhow::{anyhow, Context};
use dirs_next::home_dir;
use serde::Deserialize;
use std::fmt;
use std::fs::{create_dir_all, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const LOG_FILE_NAME: &str = "transit-star.log";

/// Line format of the log file
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Text,
    /// One JSON object per event, fields flattened, for log shippers
    Json,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Text => write!(f, "text"),
            FileFormat::Json => write!(f, "json"),
        }
    }
}

/// Determine the file layout used by the logging file sink.
pub fn log_file_path(config: &LoggingConfig, workspace_root: Option<&Path>) -> Result<PathBuf> {
    let directory = resolve_log_dir(config, workspace_root)?;
    Ok(directory.join(LOG_FILE_NAME))
}

/// Build the file sink, or `None` when `logging.enable_file` is off.
///
/// Writes go through a non-blocking appender; the returned guard flushes it on drop.
pub fn file_layer<S>(
    log_file: &Path,
    config: &LoggingConfig,
) -> Result<Option<(BoxLayer<S>, WorkerGuard)>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    if !config.enable_file {
        return Ok(None);
    }

    ensure_log_dir(log_file)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("failed to open log file {}", log_file.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let base = tracing_fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_ids(false)
        .with_thread_names(false);
    let layer: BoxLayer<S> = match config.file_format {
        FileFormat::Text => base.with_target(false).boxed(),
        FileFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .boxed(),
    };
    Ok(Some((layer, guard)))
}

fn ensure_log_dir(log_file: &Path) -> Result<()> {
    let directory = log_file.parent().ok_or_else(|| {
        anyhow!(
            "log file path {} has no parent directory",
            log_file.display()
        )
    })?;
    create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {}", directory.display()))?;
    Ok(())
}

/// Relative `log_dir` values resolve against the workspace, else against `$HOME`.
fn resolve_log_dir(config: &LoggingConfig, workspace_root: Option<&Path>) -> Result<PathBuf> {
    let base = match (&config.log_dir, workspace_root) {
        (Some(custom), _) if custom.is_absolute() => custom.clone(),
        (Some(custom), Some(workspace)) => workspace.join(custom),
        (Some(custom), None) => home_base()?.join(custom),
        (None, Some(workspace)) => workspace.join("logs"),
        (None, None) => home_base()?.join(".transit-star").join("logs"),
    };
    Ok(base)
}

fn home_base() -> Result<PathBuf> {
    home_dir().ok_or_else(|| anyhow!("$HOME directory unavailable"))
}
