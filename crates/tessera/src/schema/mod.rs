//! Column naming: normalization, aliases and required columns.

pub mod fields;
mod table;

pub use fields::{
    Field, canonical, entity_fields, field_for, id_field, lookup, normalize, resolve_key, row_id,
};
pub use table::EntitySchema;
