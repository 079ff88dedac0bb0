pub mod args;
pub mod commands;

pub use args::{ReportArgs, ReportFormat, RunArgs, StageArgs, StatusArgs, WorkspaceArgs};
use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
PIPELINE COMMANDS:\n{subcommands}\n";

#[derive(Parser)]
#[command(name = "transit-star")]
#[command(version = crate::VERSION)]
#[command(about = "Conform raw urban-transit extracts into a star-schema dataset")]
#[command(help_template = HELP_TEMPLATE)]
#[command(
    after_long_help = "Typical flow: drop extracts into the input directory, run the pipeline, then inspect status."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    #[command(
        about = "Normalize raw extracts into canonical snapshots",
        long_about = "Normalize parses every delimited extract in the input directory, classifies it, renames and types its columns, and writes one snapshot per file.",
        after_help = "Example:\n    transit-star normalize ./warehouse"
    )]
    Normalize(StageArgs),
    #[command(
        about = "Rebuild the conformed dimensions",
        long_about = "Dimensions recomputes the date, line, franchise, company and vehicle dimensions from the canonical snapshots and overwrites them.",
        after_help = "Example:\n    transit-star dimensions ./warehouse"
    )]
    Dimensions(StageArgs),
    #[command(
        about = "Append new partitions to the fact tables",
        long_about = "Facts resolves surrogate keys against the current dimensions and appends only the date partitions the fact stores do not hold yet.",
        after_help = "Example:\n    transit-star facts ./warehouse"
    )]
    Facts(StageArgs),
    #[command(
        about = "Run normalize, dimensions and facts in order",
        long_about = "Run executes all three stages, stopping at the first fatal error, and writes a run report under the gold directory.",
        after_help = "Example:\n    transit-star run ./warehouse --format json"
    )]
    Run(RunArgs),
    #[command(
        about = "Show row and partition counts of the gold tables",
        after_help = "Example:\n    transit-star status ./warehouse"
    )]
    Status(StatusArgs),
    #[command(
        about = "Print a persisted run report",
        after_help = "Example:\n    transit-star report ./warehouse --run-id 6f1c..."
    )]
    Report(ReportArgs),
}

impl Command {
    pub fn workspace(&self) -> &WorkspaceArgs {
        match self {
            Command::Normalize(args) | Command::Dimensions(args) | Command::Facts(args) => {
                &args.workspace
            }
            Command::Run(args) => &args.workspace,
            Command::Status(args) => &args.workspace,
            Command::Report(args) => &args.workspace,
        }
    }
}

pub fn run(args: Args) -> crate::Result<()> {
    match args.command {
        Command::Normalize(stage_args) => commands::normalize(stage_args),
        Command::Dimensions(stage_args) => commands::dimensions(stage_args),
        Command::Facts(stage_args) => commands::facts(stage_args),
        Command::Run(run_args) => commands::run(run_args),
        Command::Status(status_args) => commands::status(status_args),
        Command::Report(report_args) => commands::report(report_args),
    }
}
