//! Entity type definitions.

use rkyv::{Archive, Deserialize, Serialize};

use super::field::FieldDef;
use super::registry::FieldRegistry;
use crate::error::Error;

/// Identifier of a navigation category.
pub type NavigationId = u64;

/// An entity type definition as registered and persisted.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct EntityTypeDef {
    /// Entity type name (unique within the catalog).
    pub name: String,
    /// Navigation categories every entity of this type belongs to.
    pub navigation_ids: Vec<NavigationId>,
    /// Additional field definitions.
    pub fields: Vec<FieldDef>,
}

impl EntityTypeDef {
    /// Create a new entity type definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            navigation_ids: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Add a navigation category.
    pub fn with_navigation(mut self, navigation_id: NavigationId) -> Self {
        self.navigation_ids.push(navigation_id);
        self
    }

    /// Add an additional field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add multiple additional fields.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Serialize to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// A registered entity type: the immutable metadata a query runs against.
///
/// Shared as `Arc<EntityType>` between the catalog and every query built for
/// the type.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: String,
    navigation_ids: Vec<NavigationId>,
    fields: FieldRegistry,
}

impl EntityType {
    /// Compile a definition into an entity type.
    pub fn compile(def: &EntityTypeDef) -> Result<Self, Error> {
        if def.name.is_empty() {
            return Err(Error::InvalidSchema("entity type name is empty".into()));
        }

        let mut navigation_ids = def.navigation_ids.clone();
        navigation_ids.sort_unstable();
        navigation_ids.dedup();

        Ok(Self {
            name: def.name.clone(),
            navigation_ids,
            fields: FieldRegistry::build(&def.fields)?,
        })
    }

    /// Entity type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured navigation categories, ascending and deduplicated.
    pub fn navigation_ids(&self) -> &[NavigationId] {
        &self.navigation_ids
    }

    /// Additional field registry.
    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }
}
