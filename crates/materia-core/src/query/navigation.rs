//! Navigation membership stage.

use tracing::debug;

use super::{Candidates, NavigationIndex};
use crate::catalog::NavigationId;
use crate::error::Error;

/// Narrows candidates to entities placed in every configured navigation
/// category.
pub struct NavigationFilter<'a, N: NavigationIndex + ?Sized> {
    index: &'a N,
    navigation_ids: &'a [NavigationId],
}

impl<'a, N: NavigationIndex + ?Sized> NavigationFilter<'a, N> {
    /// Create a filter over the given categories.
    pub fn new(index: &'a N, navigation_ids: &'a [NavigationId]) -> Self {
        Self {
            index,
            navigation_ids,
        }
    }

    /// Members of all configured categories within `seed`.
    ///
    /// Without configured categories the seed is returned unchanged and the
    /// index is not consulted.
    pub fn find(&self, seed: Candidates) -> Result<Candidates, Error> {
        if self.navigation_ids.is_empty() {
            return Ok(seed);
        }

        let candidates = self.index.ids_by_navigation(self.navigation_ids, &seed)?;
        debug!(
            categories = self.navigation_ids.len(),
            candidates = ?candidates.len(),
            "Navigation filter applied"
        );
        Ok(candidates)
    }
}
