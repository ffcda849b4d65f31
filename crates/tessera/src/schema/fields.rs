//! Field normalization and alias-aware cell lookup.
//!
//! Source files name the same logical column in many ways ("PriorityLevel",
//! "Priority Level", "priority_level"). Every lookup goes through
//! [`normalize`], so any of those spellings resolves to the same field.

use serde_json::Value;

use crate::input::{Entity, Record};

/// Canonical key for a column name: lower-cased with all non-alphanumeric
/// characters removed.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Whether two column names refer to the same field.
pub fn same_field(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Return the first cell whose column matches one of `candidates`, trying
/// candidates in order.
pub fn lookup<'a>(row: &'a Record, candidates: &[&str]) -> Option<&'a Value> {
    resolve_key(row, candidates).and_then(|key| row.get(key))
}

/// Return the actual column key that [`lookup`] would read.
pub fn resolve_key<'a>(row: &'a Record, candidates: &[&str]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        let wanted = normalize(candidate);
        row.keys()
            .find(|key| normalize(key) == wanted)
            .map(|key| key.as_str())
    })
}

/// Whether any of `headers` matches one of `candidates`.
pub fn has_header(headers: &[String], candidates: &[&str]) -> bool {
    candidates
        .iter()
        .map(|c| normalize(c))
        .any(|wanted| headers.iter().any(|h| normalize(h) == wanted))
}

/// Render a cell as plain text for comparisons and messages.
pub fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Whether a cell counts as present and truthy.
///
/// Null, empty strings, `false` and zero are falsy; everything else,
/// including the string "0", is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A logical field: its canonical name followed by accepted aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    names: &'static [&'static str],
}

impl Field {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// The canonical name, used as the diagnostic field label.
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    /// Canonical name plus aliases, in lookup order.
    pub fn candidates(&self) -> &'static [&'static str] {
        self.names
    }

    /// Read this field from a row.
    pub fn get<'a>(&self, row: &'a Record) -> Option<&'a Value> {
        lookup(row, self.names)
    }

    /// Read this field as trimmed text; missing and empty cells are `None`.
    pub fn text(&self, row: &Record) -> Option<String> {
        self.get(row)
            .map(cell_to_string)
            .filter(|s| !s.is_empty())
    }
}

/// Canonical fields per entity.
pub mod canonical {
    use super::Field;

    pub const CLIENT_PRIORITY: Field = Field::new(&["priorityLevel", "priority"]);
    pub const REQUESTED_TASKS: Field = Field::new(&["requestedTasks", "requestedTaskIDs"]);
    pub const CLIENT_GROUP: Field = Field::new(&["groupTag", "clientGroup", "group"]);

    pub const AVAILABLE_SLOTS: Field = Field::new(&["availableSlots", "slots"]);
    pub const MAX_LOAD_PER_PHASE: Field = Field::new(&["maxLoadPerPhase", "maxLoad"]);
    pub const WORKER_SKILLS: Field = Field::new(&["skills", "workerSkills"]);
    pub const WORKER_GROUP: Field = Field::new(&["workerGroup", "groupTag", "group"]);

    pub const TASK_PRIORITY: Field = Field::new(&["priority", "priorityLevel"]);
    pub const DURATION: Field = Field::new(&["duration", "taskDuration"]);
    pub const PREFERRED_PHASES: Field = Field::new(&["preferredPhases", "phases"]);
    pub const MAX_CONCURRENT: Field = Field::new(&["maxConcurrent", "maxConcurrentTasks"]);
    pub const REQUIRED_SKILLS: Field = Field::new(&["requiredSkills", "skills"]);
    pub const PHASE: Field = Field::new(&["phase", "taskPhase"]);
    pub const DEPENDENCIES: Field = Field::new(&["dependencies", "dependsOn"]);
}

/// Id aliases for an entity: `<singular>Id`, `<singular>ID`, `<singular>_id`
/// and plain `id`. All of these normalize to either `<singular>id` or `id`.
pub fn id_field(entity: Entity) -> Field {
    match entity {
        Entity::Clients => Field::new(&["id", "clientId", "clientID", "client_id"]),
        Entity::Workers => Field::new(&["id", "workerId", "workerID", "worker_id"]),
        Entity::Tasks => Field::new(&["id", "taskId", "taskID", "task_id"]),
    }
}

/// Read a row's business key.
pub fn row_id(entity: Entity, row: &Record) -> Option<String> {
    id_field(entity).text(row)
}

/// Every known field for an entity, id first.
pub fn entity_fields(entity: Entity) -> Vec<Field> {
    use canonical::*;

    let mut fields = vec![id_field(entity)];
    fields.extend_from_slice(match entity {
        Entity::Clients => &[CLIENT_PRIORITY, REQUESTED_TASKS, CLIENT_GROUP][..],
        Entity::Workers => &[AVAILABLE_SLOTS, MAX_LOAD_PER_PHASE, WORKER_SKILLS, WORKER_GROUP][..],
        Entity::Tasks => &[
            TASK_PRIORITY,
            DURATION,
            PREFERRED_PHASES,
            MAX_CONCURRENT,
            REQUIRED_SKILLS,
            PHASE,
            DEPENDENCIES,
        ][..],
    });
    fields
}

/// The known field `name` belongs to for `entity`, matched against the
/// canonical name and every alias.
pub fn field_for(entity: Entity, name: &str) -> Option<Field> {
    entity_fields(entity)
        .into_iter()
        .find(|field| field.candidates().iter().any(|c| same_field(c, name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Priority Level"), "prioritylevel");
        assert_eq!(normalize("priority_level"), "prioritylevel");
        assert_eq!(normalize("PriorityLevel"), "prioritylevel");
        assert_eq!(normalize("Task-ID #"), "taskid");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_lookup_tries_candidates_in_order() {
        let r = row(&[("Priority", json!(2)), ("Priority Level", json!(4))]);

        assert_eq!(lookup(&r, &["priorityLevel", "priority"]), Some(&json!(4)));
        assert_eq!(lookup(&r, &["priority", "priorityLevel"]), Some(&json!(2)));
        assert_eq!(lookup(&r, &["duration"]), None);
    }

    #[test]
    fn test_aliases_resolve_across_spellings() {
        let a = row(&[("PriorityLevel", json!(3))]);
        let b = row(&[("priority", json!(3))]);
        let c = row(&[("Priority Level", json!(3))]);

        for r in [&a, &b, &c] {
            assert_eq!(canonical::CLIENT_PRIORITY.get(r), Some(&json!(3)));
        }
    }

    #[test]
    fn test_resolve_key_returns_source_spelling() {
        let r = row(&[("Max Load Per Phase", json!(2))]);
        assert_eq!(
            resolve_key(&r, canonical::MAX_LOAD_PER_PHASE.candidates()),
            Some("Max Load Per Phase")
        );
    }

    #[test]
    fn test_row_id_aliases() {
        assert_eq!(row_id(Entity::Tasks, &row(&[("TaskID", json!("T1"))])), Some("T1".into()));
        assert_eq!(
            row_id(Entity::Workers, &row(&[("worker_id", json!(" W9 "))])),
            Some("W9".into())
        );
        assert_eq!(row_id(Entity::Clients, &row(&[("id", json!(7))])), Some("7".into()));
        assert_eq!(row_id(Entity::Clients, &row(&[("id", json!(""))])), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(3)));
    }

    #[test]
    fn test_has_header() {
        let headers = vec!["Client ID".to_string(), "Priority Level".to_string()];
        assert!(has_header(&headers, &["priorityLevel", "priority"]));
        assert!(has_header(&headers, id_field(Entity::Clients).candidates()));
        assert!(!has_header(&headers, &["duration"]));
    }

    #[test]
    fn test_field_for_matches_aliases() {
        assert_eq!(field_for(Entity::Tasks, "skills"), Some(canonical::REQUIRED_SKILLS));
        assert_eq!(field_for(Entity::Workers, "skills"), Some(canonical::WORKER_SKILLS));
        assert_eq!(field_for(Entity::Clients, "Priority"), Some(canonical::CLIENT_PRIORITY));
        assert_eq!(field_for(Entity::Clients, "TaskID"), None);
        assert_eq!(field_for(Entity::Tasks, "task_id"), Some(id_field(Entity::Tasks)));
    }
}
