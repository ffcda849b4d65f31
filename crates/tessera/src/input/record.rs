//! Free-form records, per-entity datasets and the workbook snapshot.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TesseraError;

/// A single row: column name (as found in the source) to cell value.
///
/// Column names are kept verbatim; canonical field resolution happens in
/// [`crate::schema::fields`].
pub type Record = IndexMap<String, Value>;

/// The three record kinds a workbook holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Clients,
    Workers,
    Tasks,
}

impl Entity {
    /// All entities in validation order.
    pub const ALL: [Entity; 3] = [Entity::Clients, Entity::Workers, Entity::Tasks];

    /// Plural name, as used in diagnostics and proposals.
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Clients => "clients",
            Entity::Workers => "workers",
            Entity::Tasks => "tasks",
        }
    }

    /// Singular name, used to build id aliases such as `taskId`.
    pub fn singular(&self) -> &'static str {
        match self {
            Entity::Clients => "client",
            Entity::Workers => "worker",
            Entity::Tasks => "task",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Entity::Clients => "Clients",
            Entity::Workers => "Workers",
            Entity::Tasks => "Tasks",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Entity {
    type Err = TesseraError;

    /// Accepts plural or singular names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clients" | "client" => Ok(Entity::Clients),
            "workers" | "worker" => Ok(Entity::Workers),
            "tasks" | "task" => Ok(Entity::Tasks),
            _ => Err(TesseraError::UnknownEntity(s.to_string())),
        }
    }
}

/// Ordered rows of one entity plus the headers observed on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column headers in source order.
    pub headers: Vec<String>,
    /// Rows in source order. Row indices are positions in this vector.
    pub rows: Vec<Record>,
}

impl Dataset {
    /// Create a dataset with explicit headers.
    pub fn new(headers: Vec<String>, rows: Vec<Record>) -> Self {
        Self { headers, rows }
    }

    /// Create a dataset from records, taking headers from the first row's keys.
    pub fn from_records(rows: Vec<Record>) -> Self {
        let headers = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self { headers, rows }
    }

    /// Build a dataset from JSON objects; non-object values are ignored.
    pub fn from_json_rows(rows: Vec<Value>) -> Self {
        let records = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map.into_iter().collect::<Record>()),
                _ => None,
            })
            .collect();
        Self::from_records(records)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by index.
    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    /// Get a mutable row by index.
    pub fn row_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.rows.get_mut(index)
    }
}

/// The snapshot a validation pass runs over: one dataset per entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub clients: Dataset,
    pub workers: Dataset,
    pub tasks: Dataset,
}

impl Workbook {
    /// Create a workbook from the three datasets.
    pub fn new(clients: Dataset, workers: Dataset, tasks: Dataset) -> Self {
        Self {
            clients,
            workers,
            tasks,
        }
    }

    /// Get the dataset for an entity.
    pub fn dataset(&self, entity: Entity) -> &Dataset {
        match entity {
            Entity::Clients => &self.clients,
            Entity::Workers => &self.workers,
            Entity::Tasks => &self.tasks,
        }
    }

    /// Get the mutable dataset for an entity.
    pub fn dataset_mut(&mut self, entity: Entity) -> &mut Dataset {
        match entity {
            Entity::Clients => &mut self.clients,
            Entity::Workers => &mut self.workers,
            Entity::Tasks => &mut self.tasks,
        }
    }

    /// Total number of rows across all entities.
    pub fn total_rows(&self) -> usize {
        Entity::ALL.iter().map(|e| self.dataset(*e).len()).sum()
    }
}
