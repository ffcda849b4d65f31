//! Validate command - run one pass and print the diagnostics.

use colored::Colorize;
use tracing::debug;

use super::{CommandResult, Outcome, load_inputs, print_report};
use crate::cli::InputArgs;

pub fn run(inputs: InputArgs, json_output: bool, strict: bool) -> CommandResult {
    let loaded = load_inputs(&inputs)?;

    let report = loaded
        .engine
        .validate_with_progress(&loaded.workbook, &loaded.rules, &mut |percent: u8| {
            debug!(percent, "Validation progress");
        });

    if json_output {
        let output = serde_json::json!({
            "sources": loaded.sources,
            "summary": report.summary,
            "diagnostics": report.diagnostics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for source in &loaded.sources {
            println!(
                "{} {} ({} rows, {})",
                format!("{}:", source.entity.label()).cyan().bold(),
                source.file.white(),
                source.row_count,
                source.format
            );
        }
        if !loaded.rules.is_empty() {
            println!(
                "{} {} active of {}",
                "Rules:".cyan().bold(),
                loaded.rules.active().count(),
                loaded.rules.len()
            );
        }
        println!();
        print_report(&report);
    }

    if strict && !report.is_certified() {
        return Ok(Outcome::Failed);
    }
    Ok(Outcome::Clean)
}
