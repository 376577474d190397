//! Bulk additional-field fetch.

use std::collections::HashMap;

use materia_proto::{Condition, Value};
use tracing::debug;

use super::{Candidates, RowSource};
use crate::catalog::{FieldId, FieldRegistry};
use crate::entity::EntityId;
use crate::error::Error;
use crate::storage::{field_value_columns as columns, Table};

/// Fetched values: entity id -> field name -> value.
pub type FieldValues = HashMap<EntityId, HashMap<String, Value>>;

/// Fetches the values of the effective fields for a candidate set in one
/// lookup.
pub struct FieldValueFetcher<'a, S: RowSource + ?Sized> {
    source: &'a S,
    fields: &'a FieldRegistry,
    locale: &'a str,
    selection: &'a [FieldId],
}

impl<'a, S: RowSource + ?Sized> FieldValueFetcher<'a, S> {
    /// Create a fetcher. An empty `selection` fetches every known field.
    pub fn new(
        source: &'a S,
        fields: &'a FieldRegistry,
        locale: &'a str,
        selection: &'a [FieldId],
    ) -> Self {
        Self {
            source,
            fields,
            locale,
            selection,
        }
    }

    /// The fetch condition for `candidates`, or `None` when no field is
    /// effective.
    ///
    /// Localized fields match the fetcher's locale, non-localized fields
    /// match by id alone:
    /// `entity_id IN (..) AND deleted = false AND ((field_id = L AND locale = ..) OR field_id = N)`.
    pub fn fetch_condition(&self, candidates: &Candidates) -> Option<Condition> {
        let (localized, not_localized) = self.fields.partition(self.selection);
        if localized.is_empty() && not_localized.is_empty() {
            return None;
        }

        let mut field_match = Condition::or();
        for field_id in localized {
            field_match = field_match.add_condition(
                Condition::and()
                    .add(columns::FIELD_ID, field_id)
                    .add(columns::LOCALE, self.locale),
            );
        }
        for field_id in not_localized {
            field_match = field_match.add(columns::FIELD_ID, field_id);
        }

        Some(
            candidates
                .scope(Condition::and(), columns::ENTITY_ID)
                .add(columns::DELETED, false)
                .add_condition(field_match),
        )
    }

    /// Fetch values for every candidate with a single `select`.
    ///
    /// No lookup happens for an empty candidate set or when no field is
    /// effective.
    pub fn fetch(&self, candidates: &Candidates) -> Result<FieldValues, Error> {
        let mut values = FieldValues::new();
        if candidates.is_empty() {
            return Ok(values);
        }
        let Some(condition) = self.fetch_condition(candidates) else {
            return Ok(values);
        };

        let rows = self.source.select(Table::FieldValues, &condition)?;
        for row in &rows {
            let entity_id = row
                .get_id(columns::ENTITY_ID)
                .ok_or_else(|| Error::InvalidData("field value row without entity_id".into()))?;
            let field_id = row
                .get_id(columns::FIELD_ID)
                .ok_or_else(|| Error::InvalidData("field value row without field_id".into()))?;
            let (Some(name), Some(column)) =
                (self.fields.name_of(field_id), self.fields.column_for(field_id))
            else {
                return Err(Error::InconsistentMetadata { field_id });
            };

            let value = row.get(column.name()).cloned().unwrap_or(Value::Null);
            values
                .entry(entity_id)
                .or_default()
                .insert(name.to_string(), value);
        }

        debug!(
            rows = rows.len(),
            entities = values.len(),
            "Additional fields fetched"
        );
        Ok(values)
    }
}
