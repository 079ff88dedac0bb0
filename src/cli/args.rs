use clap::Args;
use std::path::PathBuf;

/// Workspace selection shared by every command
#[derive(Args, Clone, Debug)]
pub struct WorkspaceArgs {
    /// Warehouse root holding transit.toml and the data directories (default: current directory)
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Path to custom config file (default: {workspace}/transit.toml)
    #[arg(long, value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
pub struct StageArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Print the run report as terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT", help_heading = "Output Options")]
    pub format: ReportFormat,
}

#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT", help_heading = "Output Options")]
    pub format: ReportFormat,
}

#[derive(Args, Clone, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Run to show (default: the most recent run)
    #[arg(long, value_name = "RUN_ID")]
    pub run_id: Option<String>,

    /// Emit either terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT", help_heading = "Output Options")]
    pub format: ReportFormat,
}

#[derive(Clone, Copy, clap::ValueEnum, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    /// Aligned, human-readable summary
    Text,
    /// JSON payload suitable for downstream tooling
    Json,
}
