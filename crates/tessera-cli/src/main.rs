//! Tessera CLI - validate scheduling inputs before they reach a scheduler.

mod cli;
mod commands;
mod provider;

use clap::Parser;
use cli::{Cli, Commands, RulesAction};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            inputs,
            json,
            strict,
        } => commands::validate::run(inputs, json, strict),

        Commands::Fix {
            inputs,
            endpoint,
            out_dir,
            format,
        } => commands::fix::run(inputs, endpoint, out_dir, format),

        Commands::Rules { action } => match action {
            RulesAction::Check { file, inputs } => commands::rules::check(file, inputs),
            RulesAction::Export { file, output } => commands::rules::export(file, output),
        },
    };

    match result {
        Ok(commands::Outcome::Clean) => {}
        Ok(commands::Outcome::Failed) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins; otherwise warn, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
