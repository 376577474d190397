//! Query layer for Materia.
//!
//! This module implements the entity query pipeline: navigation membership,
//! additional-field value filters, entity loading and the bulk fetch of
//! additional field values. The pipeline runs against the collaborator traits
//! re-exported here, which [`StorageEngine`](crate::StorageEngine) implements.

mod backend;
mod candidates;
mod criteria;
mod fetcher;
mod field_filter;
mod generic;
mod navigation;

pub use backend::{EntityLoader, NavigationIndex, RowSource};
pub use candidates::Candidates;
pub use criteria::{FieldFilter, FieldNames, FieldSelection};
pub use fetcher::{FieldValueFetcher, FieldValues};
pub use field_filter::FieldValueFilter;
pub use generic::EntityQuery;
pub use navigation::NavigationFilter;
