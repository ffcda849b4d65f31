//! Rules commands - check and re-export rule documents.

use std::path::PathBuf;

use colored::Colorize;
use tessera::RuleSet;
use tessera::rules::check_rules;

use super::{CommandResult, Outcome, format_diagnostic, load_workbook};
use crate::cli::OptionalInputs;

/// Parse a rule document, list its rules and, when the datasets are given,
/// run the rule checks against them.
pub fn check(file: PathBuf, inputs: OptionalInputs) -> CommandResult {
    let rules = RuleSet::load(&file)?;

    println!(
        "{} {} ({} rules, {} active)",
        "Rule document".cyan().bold(),
        file.display().to_string().white(),
        rules.len(),
        rules.active().count()
    );
    for rule in rules.rules() {
        let state = if rule.active {
            "active".green()
        } else {
            "inactive".dimmed()
        };
        println!("  {} {} [{}]", rule.id, rule.kind.type_name().white(), state);
    }
    println!();

    let Some((clients, workers, tasks)) = inputs.paths() else {
        return Ok(Outcome::Clean);
    };

    let workbook = load_workbook(clients, workers, tasks)?;
    let diagnostics = check_rules(&workbook, &rules);
    if diagnostics.is_empty() {
        println!("{}", "All active rules are consistent with the data.".green());
        return Ok(Outcome::Clean);
    }

    for diag in &diagnostics {
        println!("{}", format_diagnostic(diag));
    }
    if diagnostics.iter().any(|d| d.is_error()) {
        return Ok(Outcome::Failed);
    }
    Ok(Outcome::Clean)
}

/// Load a rule document and write it back out in canonical form.
pub fn export(file: PathBuf, output: Option<PathBuf>) -> CommandResult {
    let rules = RuleSet::load(&file)?;

    match output {
        Some(path) => {
            rules.save(&path)?;
            println!(
                "{} {} rules to {}",
                "Exported".green().bold(),
                rules.len(),
                path.display()
            );
        }
        None => println!("{}", rules.export_json()?),
    }

    Ok(Outcome::Clean)
}
