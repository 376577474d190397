//! Entity type catalog.
//!
//! The catalog stores entity type definitions and the additional field
//! metadata each query resolves names against.

mod catalog;
mod entity;
mod field;
mod registry;

pub use catalog::Catalog;
pub use entity::{EntityType, EntityTypeDef, NavigationId};
pub use field::{FieldDef, FieldId, ValueColumn};
pub use registry::FieldRegistry;
