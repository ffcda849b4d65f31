//! User-authored business rules.
//!
//! Rules live in a [`RuleSet`]; only active rules take part in validation.
//! Co-run groups are checked for dependency cycles and slot restrictions for
//! dangling group references. The set round-trips through a JSON
//! [`RuleDocument`].

mod checks;
mod graph;
mod persistence;
mod rule;

pub use checks::check_rules;
pub use graph::DependencyGraph;
pub use persistence::{RULE_DOCUMENT_VERSION, RuleDocument, RuleEntry};
pub use rule::{Rule, RuleKind, RuleSet};
