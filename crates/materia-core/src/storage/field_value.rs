//! Additional field values as written to storage.

use materia_proto::Value;

use super::field_value_columns as columns;
use super::Row;
use crate::catalog::{FieldId, ValueColumn};
use crate::entity::EntityId;

/// One stored value of an additional field for an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    /// Owning entity.
    pub entity_id: EntityId,
    /// Additional field.
    pub field_id: FieldId,
    /// Locale, empty for non-localized fields.
    pub locale: String,
    /// Column the value is stored in.
    pub column: ValueColumn,
    /// Stored value.
    pub value: Value,
}

impl FieldValue {
    /// Create a non-localized value in the value column.
    pub fn new(entity_id: EntityId, field_id: FieldId, value: impl Into<Value>) -> Self {
        Self {
            entity_id,
            field_id,
            locale: String::new(),
            column: ValueColumn::Value,
            value: value.into(),
        }
    }

    /// Set the locale.
    pub fn in_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Set the value column.
    pub fn in_column(mut self, column: ValueColumn) -> Self {
        self.column = column;
        self
    }

    /// Storage key: `[entity_id (8 bytes BE)][field_id (8 bytes BE)][locale]`.
    ///
    /// Values of one entity are contiguous, so a prefix scan on the entity id
    /// returns all of them.
    pub fn key(&self) -> Vec<u8> {
        Self::encode_key(self.entity_id, self.field_id, &self.locale)
    }

    pub(crate) fn encode_key(entity_id: EntityId, field_id: FieldId, locale: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(16 + locale.len());
        key.extend_from_slice(&entity_id.to_be_bytes());
        key.extend_from_slice(&field_id.to_be_bytes());
        key.extend_from_slice(locale.as_bytes());
        key
    }

    /// The stored row.
    pub fn to_row(&self) -> Row {
        Row::new()
            .with(columns::ENTITY_ID, self.entity_id)
            .with(columns::FIELD_ID, self.field_id)
            .with(columns::LOCALE, self.locale.as_str())
            .with(self.column.name(), self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout() {
        let value = FieldValue::new(3, 7, 12.5)
            .in_column(ValueColumn::Numeric)
            .in_locale("en");
        let row = value.to_row();

        assert_eq!(row.get_id("entity_id"), Some(3));
        assert_eq!(row.get_id("field_id"), Some(7));
        assert_eq!(row.get("locale"), Some(&Value::String("en".into())));
        assert_eq!(row.get("numeric_value"), Some(&Value::Float64(12.5)));
        assert_eq!(row.get("value"), None);
    }

    #[test]
    fn test_keys_group_by_entity() {
        let a = FieldValue::new(1, 9, "x").key();
        let b = FieldValue::new(2, 1, "y").key();
        assert!(a < b);
        assert_eq!(&a[..8], &1u64.to_be_bytes());
        assert_ne!(
            FieldValue::new(1, 2, "x").in_locale("en").key(),
            FieldValue::new(1, 2, "x").in_locale("de").key()
        );
    }
}
