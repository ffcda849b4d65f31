//! Caller-facing session: one workbook, its rules and the latest report.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;
use crate::input::{Entity, Workbook};
use crate::mutation::{self, ApplyReport, FixProvider, FixRequest};
use crate::rules::{Rule, RuleKind, RuleSet};
use crate::validation::{Diagnostic, ValidationEngine, ValidationReport};

/// A validation pass captured against one generation of the session.
///
/// The pass owns a copy of the snapshot, so it can run while the session
/// keeps taking edits. Its report is only accepted if no edit happened in
/// between.
#[derive(Debug, Clone)]
pub struct PendingPass {
    generation: u64,
    workbook: Workbook,
    rules: RuleSet,
}

impl PendingPass {
    /// Generation the snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Run the pass.
    pub fn run(&self, engine: &ValidationEngine) -> ValidationReport {
        engine.validate(&self.workbook, &self.rules)
    }
}

/// Owns a workbook snapshot and keeps its diagnostics current.
///
/// Every mutation (field edit, rule change, applied fix) bumps the
/// generation and triggers a full re-validation. "Fixed" marks are advisory
/// and keyed by diagnostic id; they survive re-validation, so a finding whose
/// condition still holds comes back still marked.
pub struct Session {
    workbook: Workbook,
    rules: RuleSet,
    engine: ValidationEngine,
    report: ValidationReport,
    fixed: HashSet<String>,
    generation: u64,
}

impl Session {
    /// Create a session with the default engine and no rules.
    pub fn new(workbook: Workbook) -> Self {
        Self::with_engine(workbook, RuleSet::new(), ValidationEngine::new())
    }

    /// Create a session with explicit rules and engine.
    pub fn with_engine(workbook: Workbook, rules: RuleSet, engine: ValidationEngine) -> Self {
        let report = engine.validate(&workbook, &rules);
        Self {
            workbook,
            rules,
            engine,
            report,
            fixed: HashSet::new(),
            generation: 0,
        }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Mutation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The latest report, without fixed marks applied.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Current diagnostics with their fixed marks.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.report
            .diagnostics
            .iter()
            .cloned()
            .map(|mut d| {
                d.fixed = self.fixed.contains(&d.id);
                d
            })
            .collect()
    }

    /// Current diagnostics not marked fixed.
    pub fn unfixed(&self) -> Vec<Diagnostic> {
        self.diagnostics().into_iter().filter(|d| !d.fixed).collect()
    }

    /// Mark a diagnostic fixed. Returns false if no current diagnostic has
    /// that id.
    pub fn mark_fixed(&mut self, id: &str) -> bool {
        if self.report.get(id).is_none() {
            return false;
        }
        self.fixed.insert(id.to_string());
        true
    }

    /// Clear a fixed mark.
    pub fn unmark_fixed(&mut self, id: &str) -> bool {
        self.fixed.remove(id)
    }

    /// Edit one cell and re-validate. Returns the column key written.
    pub fn set_field(
        &mut self,
        entity: Entity,
        row_index: usize,
        field: &str,
        value: Value,
    ) -> Result<String> {
        let key = mutation::set_field(&mut self.workbook, entity, row_index, field, value)?;
        debug!(%entity, row_index, field = %key, "Field updated");
        self.mutated();
        Ok(key)
    }

    /// Add a rule and re-validate.
    pub fn add_rule(&mut self, kind: RuleKind) -> String {
        let id = self.rules.add(kind);
        self.mutated();
        id
    }

    /// Remove a rule and re-validate.
    pub fn remove_rule(&mut self, id: &str) -> Option<Rule> {
        let removed = self.rules.remove(id);
        if removed.is_some() {
            self.mutated();
        }
        removed
    }

    /// Toggle a rule and re-validate.
    pub fn toggle_rule(&mut self, id: &str) -> Option<bool> {
        let state = self.rules.toggle(id);
        if state.is_some() {
            self.mutated();
        }
        state
    }

    /// Replace the whole rule set (e.g. after an import) and re-validate.
    pub fn replace_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        self.mutated();
    }

    /// Apply untrusted proposals, then re-validate once.
    pub fn apply_proposals(&mut self, proposals: &[Value]) -> ApplyReport {
        let outcome = mutation::apply_proposals(&mut self.workbook, proposals);
        info!(
            applied = outcome.applied.len(),
            skipped = outcome.skipped.len(),
            "Applied fix proposals"
        );
        if outcome.changed() {
            self.mutated();
        }
        outcome
    }

    /// Ask a provider for fixes to the unfixed diagnostics and apply them.
    pub fn apply_fixes(&mut self, provider: &dyn FixProvider) -> Result<ApplyReport> {
        let diagnostics = self.unfixed();
        let request = FixRequest::new(&self.workbook, &diagnostics);
        if request.is_empty() {
            return Ok(ApplyReport::default());
        }

        debug!(provider = provider.name(), open = request.diagnostics.len(), "Requesting fixes");
        let proposals = provider.suggest(&request)?;
        Ok(self.apply_proposals(&proposals))
    }

    /// Capture the current snapshot for a pass run outside the session.
    pub fn begin_pass(&self) -> PendingPass {
        PendingPass {
            generation: self.generation,
            workbook: self.workbook.clone(),
            rules: self.rules.clone(),
        }
    }

    /// Install a report from a pending pass. A report from a stale
    /// generation is discarded and false is returned.
    pub fn accept_report(&mut self, pass: &PendingPass, report: ValidationReport) -> bool {
        if pass.generation != self.generation {
            debug!(
                pass = pass.generation,
                current = self.generation,
                "Discarding stale validation pass"
            );
            return false;
        }
        self.report = report;
        true
    }

    /// Re-run validation over the current snapshot.
    pub fn revalidate(&mut self) -> &ValidationReport {
        self.report = self.engine.validate(&self.workbook, &self.rules);
        &self.report
    }

    /// Consume the session, returning the edited workbook and rules.
    pub fn into_parts(self) -> (Workbook, RuleSet) {
        (self.workbook, self.rules)
    }

    fn mutated(&mut self) {
        self.generation += 1;
        self.revalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Dataset;
    use crate::mutation::RuleBasedFixer;
    use serde_json::json;

    fn session() -> Session {
        Session::new(Workbook::new(
            Dataset::from_json_rows(vec![
                json!({"ClientID": "C1", "PriorityLevel": 7}),
                json!({"ClientID": "C2", "PriorityLevel": 0}),
            ]),
            Dataset::default(),
            Dataset::default(),
        ))
    }

    #[test]
    fn test_edit_clears_only_its_diagnostic() {
        let mut s = session();
        let ids: Vec<String> = s.diagnostics().iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids.len(), 2);

        let target = s
            .diagnostics()
            .into_iter()
            .find(|d| d.row_index == Some(0))
            .unwrap();
        let other = s
            .diagnostics()
            .into_iter()
            .find(|d| d.row_index == Some(1))
            .unwrap();

        s.set_field(Entity::Clients, 0, "priorityLevel", json!(3)).unwrap();

        assert!(s.report().get(&target.id).is_none());
        assert!(s.report().get(&other.id).is_some());
        assert_eq!(s.generation(), 1);
    }

    #[test]
    fn test_fixed_mark_is_advisory() {
        let mut s = session();
        let id = s.diagnostics()[0].id.clone();

        assert!(s.mark_fixed(&id));
        assert!(!s.mark_fixed("diag_0000000000000000"));
        assert_eq!(s.unfixed().len(), 1);

        // An unrelated edit re-validates; the condition still holds, so the
        // finding returns with its mark intact.
        s.set_field(Entity::Clients, 0, "Notes", json!("x")).unwrap();
        let back = s.diagnostics().into_iter().find(|d| d.id == id).unwrap();
        assert!(back.fixed);

        assert!(s.unmark_fixed(&id));
        assert_eq!(s.unfixed().len(), 2);
    }

    #[test]
    fn test_stale_pass_discarded() {
        let mut s = session();
        let pass = s.begin_pass();
        let report = pass.run(s.engine());

        s.set_field(Entity::Clients, 1, "priorityLevel", json!(2)).unwrap();
        assert!(!s.accept_report(&pass, report));
        assert_eq!(s.report().diagnostics.len(), 1);

        let fresh = s.begin_pass();
        let report = fresh.run(s.engine());
        assert!(s.accept_report(&fresh, report));
    }

    #[test]
    fn test_rule_changes_revalidate() {
        let mut s = Session::new(Workbook::new(
            Dataset::default(),
            Dataset::default(),
            Dataset::from_json_rows(vec![
                json!({"TaskID": "T1", "Duration": 1, "RequiredSkills": "", "Dependencies": "T2"}),
                json!({"TaskID": "T2", "Duration": 1, "RequiredSkills": "", "Dependencies": "T1"}),
            ]),
        ));
        assert!(s.report().is_certified());

        let id = s.add_rule(RuleKind::CoRun {
            tasks: vec!["T1".to_string(), "T2".to_string()],
        });
        assert!(!s.report().is_certified());

        s.toggle_rule(&id);
        assert!(s.report().is_certified());
        assert!(s.remove_rule(&id).is_some());
        assert_eq!(s.generation(), 3);
    }

    #[test]
    fn test_apply_fixes_from_provider() {
        let mut s = session();
        let outcome = s.apply_fixes(&RuleBasedFixer::new()).unwrap();

        assert_eq!(outcome.applied.len(), 2);
        assert!(s.report().is_certified());
        assert_eq!(s.workbook().clients.rows[1]["PriorityLevel"], json!(1));
    }

    #[test]
    fn test_bad_proposals_leave_data_untouched() {
        let mut s = session();
        let before = s.workbook().clone();
        let outcome = s.apply_proposals(&[json!({"entity": "clients"}), json!(42)]);

        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(s.workbook(), &before);
        assert_eq!(s.generation(), 0);
    }
}
