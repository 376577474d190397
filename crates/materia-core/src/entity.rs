//! Entity objects returned by queries.
//!
//! An [`Entity`] carries fixed built-in columns plus an open attribute bag
//! for additional fields. An attribute that was never attached is absent;
//! that is a different state from an attribute attached with `Value::Null`.

use std::collections::BTreeMap;

use materia_proto::Value;

use crate::error::Error;
use crate::storage::entity_columns as columns;
use crate::storage::Row;

/// Primary identifier of an entity.
pub type EntityId = u64;

/// A content entity with built-in columns and attached additional fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Primary identifier.
    pub id: EntityId,
    /// Entity type name.
    pub entity_type: String,
    /// Identifier string (URL slug).
    pub identifier: String,
    /// Published flag.
    pub published: bool,
    /// Creation timestamp in microseconds since Unix epoch.
    pub created: i64,
    /// Modification timestamp in microseconds since Unix epoch.
    pub modified: i64,
    /// Soft-deletion flag.
    pub deleted: bool,
    attributes: BTreeMap<String, Value>,
}

impl Entity {
    /// Create an unpublished entity with no attributes.
    pub fn new(id: EntityId, entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            identifier: identifier.into(),
            published: false,
            created: 0,
            modified: 0,
            deleted: false,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the published flag.
    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    /// Set the creation timestamp.
    pub fn with_created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    /// Set the modification timestamp.
    pub fn with_modified(mut self, modified: i64) -> Self {
        self.modified = modified;
        self
    }

    /// Attach an additional field value under its display name.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Get an attached additional field value.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Check if an additional field is attached, whatever its value.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Detach an additional field, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// All attached additional fields, by name.
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Get a built-in column value by column name.
    pub fn column(&self, name: &str) -> Option<Value> {
        match name {
            columns::ID => Some(Value::UInt64(self.id)),
            columns::ENTITY_TYPE => Some(Value::String(self.entity_type.clone())),
            columns::IDENTIFIER => Some(Value::String(self.identifier.clone())),
            columns::PUBLISHED => Some(Value::Bool(self.published)),
            columns::CREATED => Some(Value::Timestamp(self.created)),
            columns::MODIFIED => Some(Value::Timestamp(self.modified)),
            columns::DELETED => Some(Value::Bool(self.deleted)),
            _ => None,
        }
    }

    /// Built-in columns as a storage row (the deletion flag is kept by the
    /// record, not the row).
    pub fn to_row(&self) -> Row {
        Row::new()
            .with(columns::ID, self.id)
            .with(columns::ENTITY_TYPE, self.entity_type.as_str())
            .with(columns::IDENTIFIER, self.identifier.as_str())
            .with(columns::PUBLISHED, self.published)
            .with(columns::CREATED, Value::Timestamp(self.created))
            .with(columns::MODIFIED, Value::Timestamp(self.modified))
    }

    /// Rebuild an entity from a storage row. Attributes start empty.
    pub fn from_row(row: &Row, deleted: bool) -> Result<Self, Error> {
        let id = row
            .get_id(columns::ID)
            .ok_or_else(|| Error::InvalidData("entity row without id".into()))?;
        let text = |name: &str| {
            row.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidData(format!("entity {} missing '{}'", id, name)))
        };
        let timestamp = |name: &str| {
            row.get(name)
                .and_then(Value::as_timestamp)
                .ok_or_else(|| Error::InvalidData(format!("entity {} missing '{}'", id, name)))
        };

        Ok(Self {
            id,
            entity_type: text(columns::ENTITY_TYPE)?,
            identifier: text(columns::IDENTIFIER)?,
            published: row
                .get(columns::PUBLISHED)
                .and_then(Value::as_bool)
                .unwrap_or(false),
            created: timestamp(columns::CREATED)?,
            modified: timestamp(columns::MODIFIED)?,
            deleted,
            attributes: BTreeMap::new(),
        })
    }
}
