//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tessera: validation and rule-consistency engine for scheduling inputs
#[derive(Parser)]
#[command(name = "tessera")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the three datasets and print the diagnostics
    Validate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 2 when any error-level diagnostic is found
        #[arg(long)]
        strict: bool,
    },

    /// Apply suggested fixes and write patched files
    Fix {
        #[command(flatten)]
        inputs: InputArgs,

        /// Fix-suggestion endpoint (default: built-in rule-based fixer)
        #[arg(long, env = "TESSERA_FIX_ENDPOINT")]
        endpoint: Option<String>,

        /// Directory for the patched files (default: alongside the inputs)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,
    },

    /// Inspect rule documents
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// Parse a rule document and check it against the datasets
    Check {
        /// Path to the rule document
        #[arg(value_name = "RULES_FILE")]
        file: PathBuf,

        #[command(flatten)]
        inputs: OptionalInputs,
    },

    /// Re-export a rule document with a fresh timestamp
    Export {
        /// Path to the rule document
        #[arg(value_name = "RULES_FILE")]
        file: PathBuf,

        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// The three dataset files plus optional rules and engine config.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Clients file (CSV/TSV)
    #[arg(long)]
    pub clients: PathBuf,

    /// Workers file (CSV/TSV)
    #[arg(long)]
    pub workers: PathBuf,

    /// Tasks file (CSV/TSV)
    #[arg(long)]
    pub tasks: PathBuf,

    /// Rule document to validate against
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Engine configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Dataset files for commands where the data is optional.
#[derive(Args, Debug, Clone)]
pub struct OptionalInputs {
    /// Clients file (CSV/TSV)
    #[arg(long, requires_all = ["workers", "tasks"])]
    pub clients: Option<PathBuf>,

    /// Workers file (CSV/TSV)
    #[arg(long, requires_all = ["clients", "tasks"])]
    pub workers: Option<PathBuf>,

    /// Tasks file (CSV/TSV)
    #[arg(long, requires_all = ["clients", "workers"])]
    pub tasks: Option<PathBuf>,
}

impl OptionalInputs {
    /// All three paths, if all were given.
    pub fn paths(&self) -> Option<(&PathBuf, &PathBuf, &PathBuf)> {
        match (&self.clients, &self.workers, &self.tasks) {
            (Some(c), Some(w), Some(t)) => Some((c, w, t)),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated
    #[default]
    Csv,
    /// Tab-separated
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            _ => Err(format!("Unknown format: {}. Use csv or tsv.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}
