//! Business rule types and the rule set that owns them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The six supported rule kinds.
///
/// On the wire the kind is the `type` tag and its parameters sit alongside
/// it: `{"type": "coRun", "tasks": ["T1", "T2"]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RuleKind {
    /// Tasks that must run together.
    CoRun { tasks: Vec<String> },
    /// A client group and/or worker group that must share slots.
    SlotRestriction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        worker_group: Option<String>,
        #[serde(default)]
        min_common_slots: u32,
    },
    /// Cap on slots a worker group may use per phase.
    LoadLimit {
        worker_group: String,
        max_slots_per_phase: u32,
    },
    /// Phases a task is allowed to run in.
    PhaseWindow {
        task_id: String,
        allowed_phases: Vec<i64>,
    },
    /// Regex-driven rule template.
    PatternMatch {
        regex: String,
        template: String,
        #[serde(default)]
        params: Value,
    },
    /// Explicit precedence for a scope.
    PrecedenceOverride { scope: String, priority: i64 },
}

impl RuleKind {
    /// Wire name of the kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            RuleKind::CoRun { .. } => "coRun",
            RuleKind::SlotRestriction { .. } => "slotRestriction",
            RuleKind::LoadLimit { .. } => "loadLimit",
            RuleKind::PhaseWindow { .. } => "phaseWindow",
            RuleKind::PatternMatch { .. } => "patternMatch",
            RuleKind::PrecedenceOverride { .. } => "precedenceOverride",
        }
    }
}

/// A rule as held by a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Opaque identity, assigned by the owning set.
    pub id: String,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub active: bool,
}

/// User-authored rules, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
    next_id: u64,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active rule and return its id.
    pub fn add(&mut self, kind: RuleKind) -> String {
        self.push(kind, true)
    }

    /// Add a rule with an explicit active flag and return its id.
    pub fn push(&mut self, kind: RuleKind, active: bool) -> String {
        self.next_id += 1;
        let id = format!("rule_{:03}", self.next_id);
        self.rules.push(Rule {
            id: id.clone(),
            kind,
            active,
        });
        id
    }

    /// Remove a rule by id.
    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    /// Flip a rule's active flag. Returns the new state.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let rule = self.rules.iter_mut().find(|r| r.id == id)?;
        rule.active = !rule.active;
        Some(rule.active)
    }

    /// Set a rule's active flag. Returns false if the id is unknown.
    pub fn set_active(&mut self, id: &str, active: bool) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.active = active;
                true
            }
            None => false,
        }
    }

    /// Get a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Active rules only.
    pub fn active(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.active)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn co_run(tasks: &[&str]) -> RuleKind {
        RuleKind::CoRun {
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_add_toggle_remove() {
        let mut rules = RuleSet::new();
        let a = rules.add(co_run(&["T1", "T2"]));
        let b = rules.add(RuleKind::PrecedenceOverride {
            scope: "global".to_string(),
            priority: 1,
        });

        assert_eq!(a, "rule_001");
        assert_eq!(b, "rule_002");
        assert_eq!(rules.active().count(), 2);

        assert_eq!(rules.toggle(&a), Some(false));
        assert_eq!(rules.active().count(), 1);
        assert!(rules.set_active(&a, true));
        assert!(!rules.set_active("rule_999", true));

        assert!(rules.remove(&b).is_some());
        assert!(rules.remove(&b).is_none());
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut rules = RuleSet::new();
        let a = rules.add(co_run(&["T1"]));
        rules.remove(&a);
        let b = rules.add(co_run(&["T2"]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_wire_format() {
        let rule = Rule {
            id: "rule_001".to_string(),
            kind: RuleKind::SlotRestriction {
                client_group: Some("GroupA".to_string()),
                worker_group: None,
                min_common_slots: 2,
            },
            active: true,
        };

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "rule_001",
                "type": "slotRestriction",
                "clientGroup": "GroupA",
                "minCommonSlots": 2,
                "active": true
            })
        );

        let back: Rule = serde_json::from_value(value).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<Rule, _> =
            serde_json::from_value(json!({"id": "x", "type": "teleport", "active": true}));
        assert!(result.is_err());
    }
}
