//! Field metadata registry.
//!
//! The registry is derived once from an entity type's field definitions and
//! is read-only afterwards. Every field id appears in all of its maps; the
//! builder rejects duplicate ids and duplicate names so no lookup can resolve
//! to an orphan.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::field::{FieldDef, FieldId, ValueColumn};
use crate::error::Error;

/// Name and storage metadata for the additional fields of one entity type.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    ids_by_name: HashMap<String, FieldId>,
    names: BTreeMap<FieldId, String>,
    columns: HashMap<FieldId, ValueColumn>,
    localized: BTreeSet<FieldId>,
    not_localized: BTreeSet<FieldId>,
}

impl FieldRegistry {
    /// Build a registry from field definitions.
    pub fn build<'a>(fields: impl IntoIterator<Item = &'a FieldDef>) -> Result<Self, Error> {
        let mut registry = Self::default();

        for field in fields {
            if registry.names.contains_key(&field.id) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field id {}",
                    field.id
                )));
            }
            if registry.ids_by_name.contains_key(&field.name) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }

            registry.ids_by_name.insert(field.name.clone(), field.id);
            registry.names.insert(field.id, field.name.clone());
            registry.columns.insert(field.id, field.column);
            if field.localized {
                registry.localized.insert(field.id);
            } else {
                registry.not_localized.insert(field.id);
            }
        }

        Ok(registry)
    }

    /// Resolve a field name to its identifier.
    pub fn resolve(&self, name: &str) -> Option<FieldId> {
        self.ids_by_name.get(name).copied()
    }

    /// Get the display name of a field.
    pub fn name_of(&self, id: FieldId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Get the storage column holding a field's value.
    pub fn column_for(&self, id: FieldId) -> Option<ValueColumn> {
        self.columns.get(&id).copied()
    }

    /// Check if a field is localized. Unknown ids are not localized.
    pub fn is_localized(&self, id: FieldId) -> bool {
        self.localized.contains(&id)
    }

    /// Localized field identifiers, ascending.
    pub fn localized_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.localized.iter().copied()
    }

    /// Non-localized field identifiers, ascending.
    pub fn not_localized_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.not_localized.iter().copied()
    }

    /// All field identifiers, ascending.
    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.names.keys().copied()
    }

    /// All `(id, name)` pairs, ascending by id.
    pub fn names(&self) -> impl Iterator<Item = (FieldId, &str)> + '_ {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Split fields into `(localized, not_localized)`.
    ///
    /// An empty `selected` slice means every known field; otherwise both
    /// partitions are restricted to the selected ids.
    pub fn partition(&self, selected: &[FieldId]) -> (Vec<FieldId>, Vec<FieldId>) {
        if selected.is_empty() {
            return (
                self.localized_ids().collect(),
                self.not_localized_ids().collect(),
            );
        }

        let localized = self
            .localized
            .iter()
            .copied()
            .filter(|id| selected.contains(id))
            .collect();
        let not_localized = self
            .not_localized
            .iter()
            .copied()
            .filter(|id| selected.contains(id))
            .collect();
        (localized, not_localized)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the registry has no fields.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_fields() -> Vec<FieldDef> {
        vec![
            FieldDef::new(1, "color"),
            FieldDef::localized(2, "title"),
            FieldDef::new(3, "price").with_column(ValueColumn::Numeric),
            FieldDef::localized(4, "description"),
        ]
    }

    #[test]
    fn test_lookups() {
        let registry = FieldRegistry::build(&product_fields()).unwrap();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.resolve("title"), Some(2));
        assert_eq!(registry.resolve("missing"), None);
        assert_eq!(registry.name_of(3), Some("price"));
        assert_eq!(registry.name_of(99), None);
        assert_eq!(registry.column_for(3), Some(ValueColumn::Numeric));
        assert_eq!(registry.column_for(1), Some(ValueColumn::Value));
        assert!(registry.is_localized(2));
        assert!(!registry.is_localized(1));
        assert!(!registry.is_localized(99));
    }

    #[test]
    fn test_partitions_are_consistent() {
        let registry = FieldRegistry::build(&product_fields()).unwrap();

        let localized: Vec<_> = registry.localized_ids().collect();
        let not_localized: Vec<_> = registry.not_localized_ids().collect();
        assert_eq!(localized, vec![2, 4]);
        assert_eq!(not_localized, vec![1, 3]);

        for id in registry.field_ids() {
            assert!(registry.name_of(id).is_some());
            assert!(registry.column_for(id).is_some());
            assert_ne!(localized.contains(&id), not_localized.contains(&id));
        }
    }

    #[test]
    fn test_partition_with_selection() {
        let registry = FieldRegistry::build(&product_fields()).unwrap();

        assert_eq!(registry.partition(&[]), (vec![2, 4], vec![1, 3]));
        assert_eq!(registry.partition(&[2]), (vec![2], vec![]));
        assert_eq!(registry.partition(&[3, 4]), (vec![4], vec![3]));
    }

    #[test]
    fn test_duplicates_rejected() {
        let duplicate_id = vec![FieldDef::new(1, "a"), FieldDef::new(1, "b")];
        assert!(matches!(
            FieldRegistry::build(&duplicate_id),
            Err(Error::InvalidSchema(_))
        ));

        let duplicate_name = vec![FieldDef::new(1, "a"), FieldDef::localized(2, "a")];
        assert!(matches!(
            FieldRegistry::build(&duplicate_name),
            Err(Error::InvalidSchema(_))
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = FieldRegistry::build(&Vec::<FieldDef>::new()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.partition(&[]), (vec![], vec![]));
    }
}
