use crate::{
    cli::args::{ReportArgs, ReportFormat, RunArgs, StageArgs, StatusArgs, WorkspaceArgs},
    core::{
        pipeline::TableStatus, ConfigLoader, ConfigValidator, Pipeline, PipelineConfig,
        RunReport,
    },
    Result,
};
use anyhow::anyhow;
use chrono::Utc;
use std::fmt::Write as _;

/// Resolve, validate and bind the configuration for one workspace
pub fn load_pipeline(workspace: &WorkspaceArgs) -> Result<Pipeline> {
    let config: PipelineConfig = match &workspace.config {
        Some(path) => ConfigLoader::load_explicit(path)?,
        None => ConfigLoader::load_from_workspace(&workspace.path)?,
    };
    ConfigValidator::validate(&config)?;
    tracing::debug!(
        root = %workspace.path.display(),
        key_space = config.keys.key_space,
        "configuration loaded"
    );
    Ok(Pipeline::new(&workspace.path, config))
}

pub fn normalize(args: StageArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let reports = pipeline.normalize(Utc::now().naive_utc())?;
    let report = RunReport {
        normalize: reports,
        ..RunReport::new(Utc::now())
    };
    print!("{}", report.render_text());
    Ok(())
}

pub fn dimensions(args: StageArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let report = RunReport {
        dimensions: pipeline.build_dimensions()?,
        ..RunReport::new(Utc::now())
    };
    print!("{}", report.render_text());
    Ok(())
}

pub fn facts(args: StageArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let report = RunReport {
        facts: pipeline.build_facts()?,
        ..RunReport::new(Utc::now())
    };
    print!("{}", report.render_text());
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let report = pipeline.run()?;
    print_report(&report, args.format)
}

pub fn status(args: StatusArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let tables = pipeline.status()?;
    match args.format {
        ReportFormat::Text => print!("{}", render_status(&tables)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&tables)?),
    }
    Ok(())
}

pub fn report(args: ReportArgs) -> Result<()> {
    let pipeline = load_pipeline(&args.workspace)?;
    let runs_dir = pipeline.layout().runs_dir();
    let report = match &args.run_id {
        Some(run_id) => {
            let path = runs_dir.join(format!("{}.json", run_id));
            if !path.exists() {
                return Err(anyhow!("Run {} not found in {}", run_id, runs_dir.display()));
            }
            RunReport::load(&path)?
        }
        None => RunReport::latest(&runs_dir)?
            .ok_or_else(|| anyhow!("No run reports in {}", runs_dir.display()))?,
    };
    print_report(&report, args.format)
}

fn print_report(report: &RunReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}

/// One line per gold table; facts also show their partition range
pub fn render_status(tables: &[TableStatus]) -> String {
    let mut out = String::new();
    for status in tables {
        if !status.present {
            let _ = writeln!(out, "{:<20} missing", status.table.as_str());
            continue;
        }
        let _ = write!(out, "{:<20} rows {:>10}", status.table.as_str(), status.rows);
        if let Some(partitions) = status.partitions {
            let range = match (partitions.min, partitions.max) {
                (Some(min), Some(max)) => format!("{}..{}", min, max),
                _ => "-".to_string(),
            };
            let _ = write!(out, "  partitions {:>6}  {}", partitions.count, range);
        }
        out.push('\n');
    }
    out
}
