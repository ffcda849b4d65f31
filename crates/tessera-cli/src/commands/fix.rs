//! Fix command - apply suggested fixes and write patched files.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tessera::input::write_delimited;
use tessera::{Entity, FixProvider, RuleBasedFixer, Session};
use tracing::info;

use super::{CommandResult, Outcome, load_inputs, print_report};
use crate::cli::{InputArgs, OutputFormat};
use crate::provider::HttpFixProvider;

pub fn run(
    inputs: InputArgs,
    endpoint: Option<String>,
    out_dir: Option<PathBuf>,
    format: OutputFormat,
) -> CommandResult {
    let loaded = load_inputs(&inputs)?;
    let mut session = Session::with_engine(loaded.workbook, loaded.rules, loaded.engine);

    let before = session.report().summary.by_severity.error;
    if session.report().diagnostics.is_empty() {
        println!("{}", "Nothing to fix: no diagnostics found.".green());
        return Ok(Outcome::Clean);
    }

    let provider: Box<dyn FixProvider> = match endpoint {
        Some(url) => Box::new(HttpFixProvider::new(url)?),
        None => Box::new(RuleBasedFixer::with_config(session.engine().config().clone())),
    };

    println!(
        "{} {} diagnostics via {}",
        "Requesting fixes for".cyan().bold(),
        session.report().diagnostics.len(),
        provider.name().white()
    );

    let outcome = session.apply_fixes(provider.as_ref())?;

    for edit in &outcome.applied {
        println!(
            "  {} {} row {} {} = {}",
            "fixed".green(),
            edit.entity,
            edit.row_index + 1,
            edit.field.cyan(),
            edit.new_value
        );
    }
    for skip in &outcome.skipped {
        println!(
            "  {} proposal #{}: {}",
            "skipped".yellow(),
            skip.index,
            skip.reason
        );
    }
    println!();

    if !outcome.changed() {
        println!("{}", "No fixes applied; files left untouched.".yellow());
        print_report(session.report());
        return Ok(Outcome::Clean);
    }

    let sources = [
        (Entity::Clients, &inputs.clients),
        (Entity::Workers, &inputs.workers),
        (Entity::Tasks, &inputs.tasks),
    ];
    let touched: Vec<Entity> = Entity::ALL
        .into_iter()
        .filter(|entity| outcome.applied.iter().any(|e| e.entity == *entity))
        .collect();

    for (entity, source) in sources {
        if !touched.contains(&entity) {
            continue;
        }
        let target = output_path(source, out_dir.as_deref(), &format)?;
        write_delimited(session.workbook().dataset(entity), &target, format.delimiter())?;
        info!(%entity, path = %target.display(), "Wrote patched file");
        println!("{} {}", "Wrote".green().bold(), target.display());
    }
    println!();

    let after = session.report().summary.by_severity.error;
    println!(
        "{} {} -> {}",
        "Errors:".cyan().bold(),
        before.to_string().red(),
        after.to_string().white().bold()
    );
    print_report(session.report());

    Ok(Outcome::Clean)
}

/// `<dir>/<stem>.fixed.<ext>`, where `<dir>` defaults to the input's directory.
fn output_path(
    source: &Path,
    out_dir: Option<&Path>,
    format: &OutputFormat,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let stem = source
        .file_stem()
        .ok_or_else(|| format!("Invalid input path: {}", source.display()))?
        .to_string_lossy();
    let name = format!("{}.fixed.{}", stem, format.extension());

    let dir = match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.to_path_buf()
        }
        None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    Ok(dir.join(name))
}
