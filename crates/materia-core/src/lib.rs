//! Materia Core - entity query layer with additional fields.
//!
//! This crate provides the entity type catalog, the sled storage engine and
//! the query pipeline that filters entities by navigation membership and
//! additional field values and attaches those values to loaded entities.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod catalog;
pub mod database;
pub mod entity;
pub mod error;
pub mod query;
pub mod storage;

pub use catalog::{
    Catalog, EntityType, EntityTypeDef, FieldDef, FieldId, FieldRegistry, NavigationId,
    ValueColumn,
};
pub use database::{Database, DatabaseConfig};
pub use entity::{Entity, EntityId};
pub use error::Error;
pub use query::{Candidates, EntityLoader, EntityQuery, NavigationIndex, RowSource};
pub use storage::{FieldValue, Record, Row, StorageConfig, StorageEngine, Table};

/// Re-export protocol types.
pub use materia_proto as proto;
