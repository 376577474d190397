//! Protocol error types.

use thiserror::Error;

/// Errors raised while building or decoding conditions.
#[derive(Debug, Error)]
pub enum Error {
    /// A relation token that does not name a supported relation.
    #[error("invalid relation: {0}")]
    InvalidRelation(String),
}
