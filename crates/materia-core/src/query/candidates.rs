//! Candidate identifier sets passed between filter stages.

use std::collections::HashSet;

use materia_proto::{Condition, Value};

use crate::entity::EntityId;

/// The entities still eligible after a filter stage.
///
/// `All` is the unconstrained set a pipeline starts from; once a stage
/// restricts it, the set only ever shrinks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Candidates {
    /// No restriction.
    #[default]
    All,
    /// Exactly these identifiers, in discovery order, without duplicates.
    Only(Vec<EntityId>),
}

impl Candidates {
    /// Build a restricted set, dropping duplicates but keeping first-seen order.
    pub fn only(ids: impl IntoIterator<Item = EntityId>) -> Self {
        let mut seen = HashSet::new();
        Candidates::Only(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }

    /// Check if no entity can match. `All` is never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Candidates::Only(ids) if ids.is_empty())
    }

    /// Check if the set is unconstrained.
    pub fn is_all(&self) -> bool {
        matches!(self, Candidates::All)
    }

    /// Restricted identifiers, or `None` for `All`.
    pub fn ids(&self) -> Option<&[EntityId]> {
        match self {
            Candidates::All => None,
            Candidates::Only(ids) => Some(ids),
        }
    }

    /// Number of restricted identifiers, or `None` for `All`.
    pub fn len(&self) -> Option<usize> {
        self.ids().map(<[EntityId]>::len)
    }

    /// Check if an identifier is in the set.
    pub fn contains(&self, id: EntityId) -> bool {
        match self {
            Candidates::All => true,
            Candidates::Only(ids) => ids.contains(&id),
        }
    }

    /// Intersect with another set, keeping this set's order.
    pub fn intersect(self, other: &Candidates) -> Candidates {
        match (self, other) {
            (candidates, Candidates::All) => candidates,
            (Candidates::All, restricted) => restricted.clone(),
            (Candidates::Only(ids), Candidates::Only(other_ids)) => {
                let keep: HashSet<EntityId> = other_ids.iter().copied().collect();
                Candidates::Only(ids.into_iter().filter(|id| keep.contains(id)).collect())
            }
        }
    }

    /// Add an `IN` restriction on `column` to a condition. `All` leaves the
    /// condition untouched.
    pub fn scope(&self, condition: Condition, column: &str) -> Condition {
        match self {
            Candidates::All => condition,
            Candidates::Only(ids) => {
                condition.add_in(column, ids.iter().map(|id| Value::UInt64(*id)).collect())
            }
        }
    }
}

impl From<Vec<EntityId>> for Candidates {
    fn from(ids: Vec<EntityId>) -> Self {
        Candidates::only(ids)
    }
}
