//! Catalog of registered entity types.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sled::{Db, Tree};
use tracing::info;

use super::{EntityType, EntityTypeDef};
use crate::error::Error;

/// Tree name for entity type definitions.
const TYPES_TREE: &str = "catalog:entity_types";

/// The catalog of entity types and their additional field metadata.
///
/// Definitions are persisted in sled; compiled entity types are cached and
/// handed out as `Arc`s. Re-registering a name swaps the cached `Arc`, so a
/// query already holding the previous one keeps an unchanged view.
pub struct Catalog {
    /// Entity type definitions tree.
    types_tree: Tree,
    /// Compiled entity types by name.
    types: RwLock<HashMap<String, Arc<EntityType>>>,
}

impl Catalog {
    /// Open or create a catalog using the given sled database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        let types_tree = db.open_tree(TYPES_TREE)?;

        let mut types = HashMap::new();
        for entry in types_tree.iter() {
            let (_, bytes) = entry?;
            let def = EntityTypeDef::from_bytes(&bytes)?;
            let entity_type = EntityType::compile(&def)?;
            types.insert(def.name, Arc::new(entity_type));
        }

        Ok(Self {
            types_tree,
            types: RwLock::new(types),
        })
    }

    /// Register (or replace) an entity type.
    pub fn register(&self, def: EntityTypeDef) -> Result<Arc<EntityType>, Error> {
        let entity_type = Arc::new(EntityType::compile(&def)?);

        self.types_tree.insert(def.name.as_bytes(), def.to_bytes()?)?;
        self.types
            .write()
            .insert(def.name.clone(), Arc::clone(&entity_type));

        info!(
            entity_type = %def.name,
            fields = entity_type.fields().len(),
            navigation = entity_type.navigation_ids().len(),
            "Registered entity type"
        );

        Ok(entity_type)
    }

    /// Get a registered entity type by name.
    pub fn get(&self, name: &str) -> Option<Arc<EntityType>> {
        self.types.read().get(name).cloned()
    }

    /// Get the persisted definition of an entity type.
    pub fn definition(&self, name: &str) -> Result<Option<EntityTypeDef>, Error> {
        match self.types_tree.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(EntityTypeDef::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List registered entity type names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }
}
