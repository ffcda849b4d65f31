//! Tessera: validation and rule-consistency engine for scheduling inputs.
//!
//! Tessera certifies three related tabular datasets (clients, workers and
//! tasks) as internally consistent before they reach a scheduler. Column
//! names are matched loosely, cells are parsed leniently, and every problem
//! becomes a [`Diagnostic`] rather than an error.
//!
//! # Core Principles
//!
//! - **Never partial**: a pass always returns the complete diagnostic list
//! - **Deterministic**: the same snapshot yields the same diagnostics and ids
//! - **Edits re-validate**: every mutation triggers a full pass
//!
//! # Example
//!
//! ```no_run
//! use tessera::{CsvLoader, Entity, RuleSet, ValidationEngine, Workbook};
//!
//! let loader = CsvLoader::new();
//! let (clients, _) = loader.load_file(Entity::Clients, "clients.csv").unwrap();
//! let (workers, _) = loader.load_file(Entity::Workers, "workers.csv").unwrap();
//! let (tasks, _) = loader.load_file(Entity::Tasks, "tasks.csv").unwrap();
//!
//! let workbook = Workbook::new(clients, workers, tasks);
//! let report = ValidationEngine::new().validate(&workbook, &RuleSet::new());
//!
//! println!("Certified: {}", report.is_certified());
//! for diag in &report.diagnostics {
//!     println!("[{}] {}: {}", diag.level.label(), diag.field, diag.message);
//! }
//! ```

pub mod config;
pub mod error;
pub mod input;
pub mod mutation;
pub mod parse;
pub mod rules;
pub mod schema;
pub mod validation;

mod session;

pub use crate::session::{PendingPass, Session};
pub use config::EngineConfig;
pub use error::{Result, TesseraError};
pub use input::{CsvLoader, Dataset, Entity, Record, SourceMetadata, Workbook};
pub use mutation::{ApplyReport, FieldEdit, FixProvider, FixRequest, RuleBasedFixer};
pub use rules::{Rule, RuleDocument, RuleKind, RuleSet};
pub use validation::{
    Diagnostic, DiagnosticCode, DiagnosticKind, Severity, ValidationEngine, ValidationReport,
};
