//! Record type for stored rows.

use std::time::{SystemTime, UNIX_EPOCH};

use rkyv::{Archive, Deserialize, Serialize};

use super::Row;
use crate::error::Error;

/// A stored row with write metadata.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Record {
    /// Stored columns.
    pub row: Row,

    /// Last write timestamp in microseconds since Unix epoch.
    pub written_at: u64,

    /// Whether the row is soft-deleted.
    pub deleted: bool,
}

impl Record {
    /// Create a live record with the current timestamp.
    pub fn new(row: Row) -> Self {
        Self {
            row,
            written_at: current_timestamp(),
            deleted: false,
        }
    }

    /// Mark the record soft-deleted, keeping its columns.
    pub fn into_deleted(mut self) -> Self {
        self.deleted = true;
        self.written_at = current_timestamp();
        self
    }

    /// The row as seen by condition evaluation: stored columns plus the
    /// soft-deletion flag under `deleted`.
    pub fn visible_row(&self) -> Row {
        self.row.clone().with("deleted", self.deleted)
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Current time in microseconds since Unix epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}
