//! Additional-field criteria accumulated by a query.

use materia_proto::Value;

use crate::catalog::FieldId;

/// Additional-field equality filters in declaration order.
///
/// Declaring a field twice keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldFilter {
    entries: Vec<(FieldId, Value)>,
}

impl FieldFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field_id` to equal `value`.
    pub fn insert(&mut self, field_id: FieldId, value: Value) {
        match self.entries.iter_mut().find(|(id, _)| *id == field_id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field_id, value)),
        }
    }

    /// Required value for a field.
    pub fn get(&self, field_id: FieldId) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(id, _)| *id == field_id)
            .map(|(_, value)| value)
    }

    /// Filters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &Value)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }

    /// Number of filtered fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no field is filtered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Additional fields a query materializes. Empty means every known field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    entries: Vec<(FieldId, String)>,
}

impl FieldSelection {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a field. Selecting it again is a no-op.
    pub fn insert(&mut self, field_id: FieldId, name: impl Into<String>) {
        if !self.contains(field_id) {
            self.entries.push((field_id, name.into()));
        }
    }

    /// Check if a field is selected.
    pub fn contains(&self, field_id: FieldId) -> bool {
        self.entries.iter().any(|(id, _)| *id == field_id)
    }

    /// Selected field ids in selection order.
    pub fn ids(&self) -> Vec<FieldId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Selected field names in selection order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, name)| name.as_str())
    }

    /// Number of selected fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One or many field names, as accepted by `select`.
pub trait FieldNames {
    /// The names in order.
    fn field_names(&self) -> Vec<&str>;
}

impl FieldNames for &str {
    fn field_names(&self) -> Vec<&str> {
        vec![*self]
    }
}

impl FieldNames for String {
    fn field_names(&self) -> Vec<&str> {
        vec![self.as_str()]
    }
}

impl FieldNames for &[&str] {
    fn field_names(&self) -> Vec<&str> {
        self.to_vec()
    }
}

impl<const N: usize> FieldNames for [&str; N] {
    fn field_names(&self) -> Vec<&str> {
        self.to_vec()
    }
}

impl FieldNames for Vec<&str> {
    fn field_names(&self) -> Vec<&str> {
        self.clone()
    }
}

impl FieldNames for Vec<String> {
    fn field_names(&self) -> Vec<&str> {
        self.iter().map(String::as_str).collect()
    }
}
