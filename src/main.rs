use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use transit_star::cli::{self, Args};
use transit_star::core::{AppError, DefaultErrorReporter, ErrorReporter};
use transit_star::logging;

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let _guard = logging::init(&args.command).context("failed to initialize logging")?;

    match cli::run(args) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            let app_error = err.downcast::<AppError>().unwrap_or_else(AppError::from);
            DefaultErrorReporter::new().report_error(&app_error);
            Ok(ExitCode::from(app_error.exit_code()))
        }
    }
}
