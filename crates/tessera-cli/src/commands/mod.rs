//! CLI command implementations.

pub mod fix;
pub mod rules;
pub mod validate;

use std::path::Path;

use colored::Colorize;
use tessera::{
    CsvLoader, Diagnostic, EngineConfig, Entity, RuleSet, Severity, SourceMetadata,
    ValidationEngine, ValidationReport, Workbook,
};
use tracing::debug;

use crate::cli::InputArgs;

pub type CommandResult = Result<Outcome, Box<dyn std::error::Error>>;

/// How a command that completed without error wants the process to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// Validation found errors and the caller asked for a failing exit.
    Failed,
}

/// Everything loaded from the command line inputs.
pub struct Loaded {
    pub workbook: Workbook,
    pub rules: RuleSet,
    pub engine: ValidationEngine,
    pub sources: Vec<SourceMetadata>,
}

/// Load the three datasets, the optional rule document and engine config.
pub fn load_inputs(inputs: &InputArgs) -> Result<Loaded, Box<dyn std::error::Error>> {
    let loader = CsvLoader::new();
    let (clients, c_meta) = loader.load_file(Entity::Clients, &inputs.clients)?;
    let (workers, w_meta) = loader.load_file(Entity::Workers, &inputs.workers)?;
    let (tasks, t_meta) = loader.load_file(Entity::Tasks, &inputs.tasks)?;

    let rules = match &inputs.rules {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::new(),
    };

    let config = match &inputs.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    debug!(rules = rules.len(), "Inputs loaded");

    Ok(Loaded {
        workbook: Workbook::new(clients, workers, tasks),
        rules,
        engine: ValidationEngine::with_config(config),
        sources: vec![c_meta, w_meta, t_meta],
    })
}

/// Load just the workbook for the given paths.
pub fn load_workbook(
    clients: &Path,
    workers: &Path,
    tasks: &Path,
) -> Result<Workbook, Box<dyn std::error::Error>> {
    let loader = CsvLoader::new();
    let (clients, _) = loader.load_file(Entity::Clients, clients)?;
    let (workers, _) = loader.load_file(Entity::Workers, workers)?;
    let (tasks, _) = loader.load_file(Entity::Tasks, tasks)?;
    Ok(Workbook::new(clients, workers, tasks))
}

/// One diagnostic as a terminal line.
pub fn format_diagnostic(diag: &Diagnostic) -> String {
    let level = match diag.level {
        Severity::Error => "ERROR".red().bold(),
        Severity::Warning => "WARN ".yellow().bold(),
        Severity::Info => "INFO ".blue().bold(),
    };

    let location = match diag.row_index {
        Some(row) => format!("{} row {}", diag.entity, row + 1),
        None => diag.entity.to_string(),
    };

    format!(
        "  {} {} [{}] {}",
        level,
        location.dimmed(),
        diag.field.cyan(),
        diag.message
    )
}

/// Print the diagnostics grouped by entity, then the summary.
pub fn print_report(report: &ValidationReport) {
    for entity in Entity::ALL {
        let diags: Vec<&Diagnostic> = report.for_entity(entity).collect();
        if diags.is_empty() {
            continue;
        }
        println!("{}", format!("{}:", entity.label()).yellow().bold());
        for diag in diags {
            println!("{}", format_diagnostic(diag));
        }
        println!();
    }

    let counts = &report.summary.by_severity;
    println!(
        "{} {} errors, {} warnings, {} info across {} rows",
        "Summary:".cyan().bold(),
        counts.error.to_string().red(),
        counts.warning.to_string().yellow(),
        counts.info.to_string().blue(),
        report.summary.total_rows
    );

    if report.is_certified() {
        println!("{}", report.summary.recommendation.green());
    } else {
        println!("{}", report.summary.recommendation.red());
    }
}
