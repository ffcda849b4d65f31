//! Targeted field edits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TesseraError};
use crate::input::{Entity, Workbook};
use crate::schema::{field_for, resolve_key};

/// One cell write: `{entity, rowIndex, field, newValue}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEdit {
    pub entity: Entity,
    pub row_index: usize,
    pub field: String,
    pub new_value: Value,
}

impl FieldEdit {
    pub fn new(
        entity: Entity,
        row_index: usize,
        field: impl Into<String>,
        new_value: Value,
    ) -> Self {
        Self {
            entity,
            row_index,
            field: field.into(),
            new_value,
        }
    }

    /// Apply this edit to a workbook. Returns the column key written.
    pub fn apply(&self, workbook: &mut Workbook) -> Result<String> {
        set_field(
            workbook,
            self.entity,
            self.row_index,
            &self.field,
            self.new_value.clone(),
        )
    }
}

/// Write `value` into `field` of one row.
///
/// The field is matched against the row's own column names by normalized
/// equality, then through the entity's alias table, so `"priority"` lands in
/// an existing `"Priority Level"` column. If nothing matches, the literal
/// key is added to the row and to the dataset headers.
///
/// Returns the column key that was written.
pub fn set_field(
    workbook: &mut Workbook,
    entity: Entity,
    row_index: usize,
    field: &str,
    value: Value,
) -> Result<String> {
    let dataset = workbook.dataset_mut(entity);
    let len = dataset.len();
    let row = dataset
        .rows
        .get_mut(row_index)
        .ok_or(TesseraError::RowOutOfRange {
            entity,
            row_index,
            len,
        })?;

    let key = resolve_key(row, &[field])
        .or_else(|| field_for(entity, field).and_then(|f| resolve_key(row, f.candidates())))
        .map(str::to_string)
        .unwrap_or_else(|| field.to_string());

    row.insert(key.clone(), value);

    if !dataset.headers.iter().any(|h| h == &key) {
        dataset.headers.push(key.clone());
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Dataset;
    use serde_json::json;

    fn workbook() -> Workbook {
        Workbook::new(
            Dataset::from_json_rows(vec![json!({"ClientID": "C1", "Priority Level": 7})]),
            Dataset::default(),
            Dataset::default(),
        )
    }

    #[test]
    fn test_resolves_existing_spelling() {
        let mut wb = workbook();
        let key = set_field(&mut wb, Entity::Clients, 0, "priorityLevel", json!(3)).unwrap();

        assert_eq!(key, "Priority Level");
        assert_eq!(wb.clients.rows[0]["Priority Level"], json!(3));
        assert_eq!(wb.clients.rows[0].len(), 2);
    }

    #[test]
    fn test_resolves_through_alias() {
        let mut wb = workbook();
        let key = set_field(&mut wb, Entity::Clients, 0, "priority", json!(2)).unwrap();
        assert_eq!(key, "Priority Level");
    }

    #[test]
    fn test_unknown_field_added_literally() {
        let mut wb = workbook();
        let key = set_field(&mut wb, Entity::Clients, 0, "Notes", json!("vip")).unwrap();

        assert_eq!(key, "Notes");
        assert_eq!(wb.clients.rows[0]["Notes"], json!("vip"));
        assert!(wb.clients.headers.contains(&"Notes".to_string()));
    }

    #[test]
    fn test_row_out_of_range() {
        let mut wb = workbook();
        let err = set_field(&mut wb, Entity::Clients, 5, "priorityLevel", json!(3)).unwrap_err();
        assert!(matches!(
            err,
            TesseraError::RowOutOfRange {
                row_index: 5,
                len: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_edit_wire_format() {
        let edit: FieldEdit = serde_json::from_value(json!({
            "entity": "tasks", "rowIndex": 2, "field": "duration", "newValue": 1
        }))
        .unwrap();
        assert_eq!(edit, FieldEdit::new(Entity::Tasks, 2, "duration", json!(1)));
    }
}
