//! Tables and rows exchanged with storage collaborators.

use std::fmt;

use materia_proto::Value;
use rkyv::{Archive, Deserialize, Serialize};

/// Column names of the entity table.
pub mod entity_columns {
    /// Primary identifier.
    pub const ID: &str = "id";
    /// Entity type name.
    pub const ENTITY_TYPE: &str = "entity_type";
    /// Identifier string (URL slug).
    pub const IDENTIFIER: &str = "identifier";
    /// Published flag.
    pub const PUBLISHED: &str = "published";
    /// Creation timestamp.
    pub const CREATED: &str = "created";
    /// Modification timestamp.
    pub const MODIFIED: &str = "modified";
    /// Soft-deletion flag.
    pub const DELETED: &str = "deleted";
}

/// Column names of the additional field value table.
///
/// Values live in one of the columns named by
/// [`ValueColumn`](crate::catalog::ValueColumn).
pub mod field_value_columns {
    /// Owning entity.
    pub const ENTITY_ID: &str = "entity_id";
    /// Additional field.
    pub const FIELD_ID: &str = "field_id";
    /// Locale, empty for non-localized values.
    pub const LOCALE: &str = "locale";
    /// Soft-deletion flag.
    pub const DELETED: &str = "deleted";
}

/// Column names of the navigation membership table.
pub mod navigation_columns {
    /// Navigation category.
    pub const NAVIGATION_ID: &str = "navigation_id";
    /// Member entity.
    pub const ENTITY_ID: &str = "entity_id";
}

/// Tables a condition can be executed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Entities and their built-in columns.
    Entities,
    /// Additional field values.
    FieldValues,
    /// Navigation memberships.
    Navigation,
}

impl Table {
    /// Table name.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Entities => "entities",
            Table::FieldValues => "field_values",
            Table::Navigation => "navigation",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named column value.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column value.
    pub value: Value,
}

/// A row of named column values.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<Column>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Add or replace a column.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.value = value,
            None => self.columns.push(Column { name, value }),
        }
    }

    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    /// Get an identifier column.
    pub fn get_id(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|c| (c.name.as_str(), &c.value))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
