//! Additional field definitions.

use rkyv::{Archive, Deserialize, Serialize};

/// Identifier of an additional field.
pub type FieldId = u64;

/// Storage column that holds an additional field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Archive, Serialize, Deserialize)]
pub enum ValueColumn {
    /// Free-form value column (text, booleans, dates).
    #[default]
    Value,
    /// Numeric value column.
    Numeric,
    /// Key column for references to other records.
    Key,
}

impl ValueColumn {
    /// Column name in the field value table.
    pub fn name(&self) -> &'static str {
        match self {
            ValueColumn::Value => "value",
            ValueColumn::Numeric => "numeric_value",
            ValueColumn::Key => "key_value",
        }
    }
}

/// An additional field definition within an entity type.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field identifier (primary key).
    pub id: FieldId,
    /// Display name, unique within the entity type.
    pub name: String,
    /// Whether values vary by locale.
    pub localized: bool,
    /// Column holding the value.
    pub column: ValueColumn,
}

impl FieldDef {
    /// Create a non-localized field stored in the value column.
    pub fn new(id: FieldId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            localized: false,
            column: ValueColumn::Value,
        }
    }

    /// Create a localized field stored in the value column.
    pub fn localized(id: FieldId, name: impl Into<String>) -> Self {
        Self {
            localized: true,
            ..Self::new(id, name)
        }
    }

    /// Set the value column.
    pub fn with_column(mut self, column: ValueColumn) -> Self {
        self.column = column;
        self
    }
}
