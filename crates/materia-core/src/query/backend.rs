//! Collaborator contracts the query pipeline runs against.
//!
//! [`StorageEngine`](crate::storage::StorageEngine) implements all three;
//! tests and embedders can substitute their own.

use materia_proto::Condition;

use super::Candidates;
use crate::catalog::NavigationId;
use crate::entity::Entity;
use crate::error::Error;
use crate::storage::{Row, Table};

/// Executes condition trees against a table.
pub trait RowSource {
    /// Return every row of `table` matching `condition`.
    fn select(&self, table: Table, condition: &Condition) -> Result<Vec<Row>, Error>;
}

/// Resolves navigation category membership.
pub trait NavigationIndex {
    /// Entities in `seed` that belong to every category in `navigation_ids`.
    ///
    /// An empty `navigation_ids` slice imposes no restriction: the seed is
    /// returned unchanged.
    fn ids_by_navigation(
        &self,
        navigation_ids: &[NavigationId],
        seed: &Candidates,
    ) -> Result<Candidates, Error>;
}

/// Loads entity objects.
pub trait EntityLoader {
    /// Load the non-deleted entities of `entity_type` in `candidates` whose
    /// built-in columns satisfy `condition`. Attribute bags are empty.
    fn load(
        &self,
        entity_type: &str,
        candidates: &Candidates,
        condition: &Condition,
    ) -> Result<Vec<Entity>, Error>;
}
