//! Core error types.

use thiserror::Error;

use crate::catalog::FieldId;

/// Core query layer errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] materia_proto::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// Entity type was never registered.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Field name is not defined for the entity type.
    #[error("unknown field '{field}' for entity type '{entity_type}'")]
    UnknownField { entity_type: String, field: String },

    /// Entity type definition is not self-consistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A stored row references a field the registry does not know.
    #[error("inconsistent field metadata: field {field_id} is missing from the registry")]
    InconsistentMetadata { field_id: FieldId },

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Failure reported by an external collaborator.
    #[error("backend error: {0}")]
    Backend(String),
}
