use super::BoxLayer;
use crate::logging::context::ExecutionContext;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Where console logs should be emitted.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleOutput {
    Stdout,
    #[default]
    Stderr,
    None,
}

impl fmt::Display for ConsoleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleOutput::Stdout => write!(f, "stdout"),
            ConsoleOutput::Stderr => write!(f, "stderr"),
            ConsoleOutput::None => write!(f, "none"),
        }
    }
}

impl FromStr for ConsoleOutput {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stdout" => Ok(ConsoleOutput::Stdout),
            "stderr" => Ok(ConsoleOutput::Stderr),
            "none" => Ok(ConsoleOutput::None),
            _ => Err(format!(
                "invalid logging.console_output '{}'; supported values are stdout, stderr, none",
                value
            )),
        }
    }
}

/// Derive the console output sink from the execution context and optional user override.
///
/// Scheduled runs never write to the console; reports on stdout stay machine-readable.
pub fn select_console_output(
    context: ExecutionContext,
    configured: Option<ConsoleOutput>,
) -> ConsoleOutput {
    if context.disables_console() {
        return ConsoleOutput::None;
    }
    configured.unwrap_or_default()
}

/// Compact single-line console sink; `None` when console output is off.
pub fn console_layer<S>(output: ConsoleOutput) -> Option<BoxLayer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let base = tracing_fmt::layer()
        .compact()
        .without_time()
        .with_target(false);
    match output {
        ConsoleOutput::Stdout => Some(base.with_writer(io::stdout).boxed()),
        ConsoleOutput::Stderr => Some(base.with_writer(io::stderr).boxed()),
        ConsoleOutput::None => None,
    }
}
