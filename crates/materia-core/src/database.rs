//! Database wrapper combining StorageEngine and Catalog.

use std::path::PathBuf;
use std::sync::Arc;

use materia_proto::Value;
use tracing::debug;

use crate::catalog::{Catalog, EntityType, EntityTypeDef, FieldId, NavigationId};
use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::query::EntityQuery;
use crate::storage::{FieldValue, StorageConfig, StorageEngine};

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// Configuration for opening a [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Storage engine configuration.
    pub storage: StorageConfig,

    /// Locale for queries and localized writes that do not name one.
    pub default_locale: String,
}

impl DatabaseConfig {
    /// Create a configuration storing data at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig::new(path),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Create a configuration for a temporary database.
    pub fn temporary() -> Self {
        Self {
            storage: StorageConfig::temporary(),
            default_locale: DEFAULT_LOCALE.to_string(),
        }
    }

    /// Set the default locale.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }
}

/// Database wrapper that provides access to storage and catalog.
pub struct Database {
    storage: StorageEngine,
    catalog: Catalog,
    config: DatabaseConfig,
}

impl Database {
    /// Open a database with the given configuration.
    pub fn open(config: DatabaseConfig) -> Result<Self, Error> {
        let storage = StorageEngine::open(config.storage.clone())?;
        let catalog = Catalog::open(storage.db())?;

        Ok(Self {
            storage,
            catalog,
            config,
        })
    }

    /// Register (or replace) an entity type.
    pub fn register(&self, def: EntityTypeDef) -> Result<Arc<EntityType>, Error> {
        self.catalog.register(def)
    }

    /// Get a registered entity type.
    pub fn entity_type(&self, name: &str) -> Result<Arc<EntityType>, Error> {
        self.catalog
            .get(name)
            .ok_or_else(|| Error::UnknownEntityType(name.to_string()))
    }

    /// Start a query over an entity type in the default locale.
    pub fn query(&self, entity_type: &str) -> Result<EntityQuery<'_, StorageEngine>, Error> {
        self.query_in(entity_type, &self.config.default_locale)
    }

    /// Start a query over an entity type in `locale`.
    pub fn query_in(
        &self,
        entity_type: &str,
        locale: &str,
    ) -> Result<EntityQuery<'_, StorageEngine>, Error> {
        Ok(EntityQuery::new(
            &self.storage,
            self.entity_type(entity_type)?,
            locale,
        ))
    }

    /// Insert or replace an entity.
    ///
    /// An entity with id `0` gets a generated id. Attached attributes are
    /// written as additional field values in the default locale; every
    /// attribute must name a field of the entity type. Replacing an entity
    /// soft deletes the field values of its previous version.
    pub fn insert(&self, mut entity: Entity) -> Result<EntityId, Error> {
        let entity_type = self.entity_type(&entity.entity_type)?;
        let fields = entity_type.fields();

        // Resolve every attribute before writing anything.
        let mut values = Vec::with_capacity(entity.attributes().len());
        for (name, value) in entity.attributes() {
            let field_id = fields.resolve(name).ok_or_else(|| Error::UnknownField {
                entity_type: entity.entity_type.clone(),
                field: name.clone(),
            })?;
            values.push((field_id, value.clone()));
        }

        if entity.id == 0 {
            entity.id = self.storage.generate_id()?;
        } else {
            let cleared = self.storage.clear_field_values(entity.id)?;
            if cleared > 0 {
                debug!(id = entity.id, cleared, "Replaced entity field values");
            }
        }
        self.storage.put_entity(&entity)?;

        for (field_id, value) in values {
            self.storage
                .put_field_value(&self.field_value(&entity_type, entity.id, field_id, None, value))?;
        }

        debug!(entity_type = %entity.entity_type, id = entity.id, "Entity stored");
        Ok(entity.id)
    }

    /// Store one additional field value.
    ///
    /// Localized fields are stored under `locale`, or the default locale when
    /// `None`; the locale is ignored for non-localized fields.
    pub fn set_field(
        &self,
        entity_type: &str,
        entity_id: EntityId,
        field: &str,
        locale: Option<&str>,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let ty = self.entity_type(entity_type)?;
        let field_id = ty.fields().resolve(field).ok_or_else(|| Error::UnknownField {
            entity_type: entity_type.to_string(),
            field: field.to_string(),
        })?;

        self.storage
            .put_field_value(&self.field_value(&ty, entity_id, field_id, locale, value.into()))
    }

    fn field_value(
        &self,
        entity_type: &EntityType,
        entity_id: EntityId,
        field_id: FieldId,
        locale: Option<&str>,
        value: Value,
    ) -> FieldValue {
        let fields = entity_type.fields();
        let mut field_value = FieldValue::new(entity_id, field_id, value)
            .in_column(fields.column_for(field_id).unwrap_or_default());
        if fields.is_localized(field_id) {
            field_value =
                field_value.in_locale(locale.unwrap_or(self.config.default_locale.as_str()));
        }
        field_value
    }

    /// Place an entity in a navigation category.
    pub fn attach_navigation(
        &self,
        navigation_id: NavigationId,
        entity_id: EntityId,
    ) -> Result<(), Error> {
        self.storage.attach_navigation(navigation_id, entity_id)
    }

    /// Soft delete an entity.
    pub fn delete(&self, entity_id: EntityId) -> Result<bool, Error> {
        self.storage.delete_entity(entity_id)
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.storage.flush()
    }

    /// Get a reference to the storage engine.
    pub fn storage(&self) -> &StorageEngine {
        &self.storage
    }

    /// Get a reference to the catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}
