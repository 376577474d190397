//! Entity query builder.
//!
//! An [`EntityQuery`] accumulates built-in predicates, additional-field
//! filters and a field selection, then runs the pipeline on [`find`]:
//!
//! 1. navigation membership narrows the candidate set,
//! 2. each additional-field filter narrows it further (stopping once empty),
//! 3. surviving entities are loaded with the built-in predicates,
//! 4. additional field values for the loaded entities are fetched in one
//!    lookup and attached to each entity.
//!
//! [`find`]: EntityQuery::find

use std::collections::BTreeMap;
use std::sync::Arc;

use materia_proto::{Condition, Relation, Value};
use tracing::{debug, instrument};

use super::{
    Candidates, EntityLoader, FieldFilter, FieldNames, FieldSelection, FieldValueFetcher,
    FieldValueFilter, NavigationFilter, NavigationIndex, RowSource,
};
use crate::catalog::EntityType;
use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::storage::entity_columns as columns;

/// A query over the entities of one type.
pub struct EntityQuery<'a, B: RowSource + NavigationIndex + EntityLoader + ?Sized> {
    backend: &'a B,
    entity_type: Arc<EntityType>,
    locale: String,
    filter: FieldFilter,
    selection: FieldSelection,
    condition: Condition,
}

impl<'a, B: RowSource + NavigationIndex + EntityLoader + ?Sized> EntityQuery<'a, B> {
    /// Create a query for `entity_type` resolving localized fields in `locale`.
    pub fn new(backend: &'a B, entity_type: Arc<EntityType>, locale: impl Into<String>) -> Self {
        Self {
            backend,
            entity_type,
            locale: locale.into(),
            filter: FieldFilter::new(),
            selection: FieldSelection::new(),
            condition: Condition::and(),
        }
    }

    /// Require the identifier to equal `value`.
    pub fn identifier(&mut self, value: impl Into<String>) -> &mut Self {
        self.condition
            .push_relation(columns::IDENTIFIER, value.into(), Relation::Equal);
        self
    }

    /// Require the published flag to equal `value`.
    pub fn published(&mut self, value: bool) -> &mut Self {
        self.condition
            .push_relation(columns::PUBLISHED, value, Relation::Equal);
        self
    }

    /// Compare the creation timestamp (microseconds) against `value`.
    pub fn created(&mut self, value: i64, relation: Relation) -> &mut Self {
        self.condition
            .push_relation(columns::CREATED, Value::Timestamp(value), relation);
        self
    }

    /// Compare the modification timestamp (microseconds) against `value`.
    pub fn modified(&mut self, value: i64, relation: Relation) -> &mut Self {
        self.condition
            .push_relation(columns::MODIFIED, Value::Timestamp(value), relation);
        self
    }

    /// Restrict materialization to the named fields.
    ///
    /// Names unknown to the entity type are ignored.
    pub fn select(&mut self, names: impl FieldNames) -> &mut Self {
        let fields = self.entity_type.fields();
        for name in names.field_names() {
            match fields.resolve(name) {
                Some(field_id) => self.selection.insert(field_id, name),
                None => debug!(field = name, "Ignoring unknown field in select"),
            }
        }
        self
    }

    /// Require an additional field to equal `value`.
    ///
    /// A name unknown to the entity type is ignored. Declaring the same field
    /// again replaces the value.
    pub fn where_field(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.where_field_with(name, value, Relation::Equal)
    }

    /// Filter an additional field with an explicit relation.
    ///
    /// Only equality is applied by the field filter stage; any other
    /// relation is treated as equality.
    pub fn where_field_with(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        relation: Relation,
    ) -> &mut Self {
        let Some(field_id) = self.entity_type.fields().resolve(name) else {
            debug!(field = name, "Ignoring unknown field in where");
            return self;
        };
        if !relation.is_equal() {
            debug!(
                field = name,
                %relation,
                "Additional field filters only apply equality"
            );
        }
        self.filter.insert(field_id, value.into());
        self
    }

    /// Run the query.
    ///
    /// Returns the matching entities keyed by id, each carrying the values of
    /// the effective fields (the selection, or every known field) that are
    /// stored for it. Can be called repeatedly.
    #[instrument(skip(self), fields(entity_type = %self.entity_type.name(), locale = %self.locale))]
    pub fn find(&self) -> Result<BTreeMap<EntityId, Entity>, Error> {
        let fields = self.entity_type.fields();

        let candidates = NavigationFilter::new(self.backend, self.entity_type.navigation_ids())
            .find(Candidates::All)?;
        let candidates = FieldValueFilter::new(self.backend, fields, &self.locale)
            .apply(&self.filter, candidates)?;
        if candidates.is_empty() {
            debug!("No candidates left after filtering");
            return Ok(BTreeMap::new());
        }

        let entities = self
            .backend
            .load(self.entity_type.name(), &candidates, &self.condition)?;
        if entities.is_empty() {
            debug!("No entities loaded");
            return Ok(BTreeMap::new());
        }

        let loaded = Candidates::only(entities.iter().map(|entity| entity.id));
        let selection = self.selection.ids();
        let mut values = FieldValueFetcher::new(self.backend, fields, &self.locale, &selection)
            .fetch(&loaded)?;

        let effective: Vec<&str> = if self.selection.is_empty() {
            fields.names().map(|(_, name)| name).collect()
        } else {
            self.selection.names().collect()
        };

        let mut result = BTreeMap::new();
        for mut entity in entities {
            if let Some(mut fetched) = values.remove(&entity.id) {
                for name in &effective {
                    match fetched.remove(*name) {
                        Some(value) if !value.is_null() => entity.set_attribute(*name, value),
                        _ => {}
                    }
                }
            }
            result.insert(entity.id, entity);
        }

        debug!(entities = result.len(), "Query finished");
        Ok(result)
    }

    /// Locale localized fields are resolved in.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The queried entity type.
    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.entity_type
    }

    /// Accumulated additional-field filters.
    pub fn field_filter(&self) -> &FieldFilter {
        &self.filter
    }

    /// Accumulated field selection.
    pub fn selection(&self) -> &FieldSelection {
        &self.selection
    }

    /// Accumulated built-in predicates.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}
