//! Required-column declarations per entity.

use crate::input::Entity;

use super::fields::{Field, canonical, has_header, id_field};

/// The columns an entity's file must carry.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub entity: Entity,
    pub required: Vec<Field>,
}

impl EntitySchema {
    /// The declared schema for an entity.
    pub fn for_entity(entity: Entity) -> Self {
        let required = match entity {
            Entity::Clients => vec![id_field(entity), canonical::CLIENT_PRIORITY],
            Entity::Workers => vec![
                id_field(entity),
                canonical::AVAILABLE_SLOTS,
                canonical::MAX_LOAD_PER_PHASE,
            ],
            Entity::Tasks => vec![
                id_field(entity),
                canonical::DURATION,
                canonical::REQUIRED_SKILLS,
            ],
        };
        Self { entity, required }
    }

    /// Canonical names of required fields missing from `headers`.
    pub fn missing_columns(&self, headers: &[String]) -> Vec<&'static str> {
        self.required
            .iter()
            .filter(|field| !has_header(headers, field.candidates()))
            .map(|field| field.name())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_columns_alias_aware() {
        let schema = EntitySchema::for_entity(Entity::Workers);
        let missing = schema.missing_columns(&headers(&["WorkerID", "Slots"]));
        assert_eq!(missing, vec!["maxLoadPerPhase"]);
    }

    #[test]
    fn test_all_present() {
        let schema = EntitySchema::for_entity(Entity::Tasks);
        let missing =
            schema.missing_columns(&headers(&["TaskID", "Duration", "RequiredSkills", "Extra"]));
        assert!(missing.is_empty());
    }

    #[test]
    fn test_all_missing() {
        let schema = EntitySchema::for_entity(Entity::Clients);
        assert_eq!(
            schema.missing_columns(&headers(&["name"])),
            vec!["id", "priorityLevel"]
        );
    }
}
