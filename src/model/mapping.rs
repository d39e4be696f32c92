//! Mapping record - a gist id association

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// An association between an externally visible gist id and an internally
/// generated id
///
/// Created on store, never deleted or mutated by the relay; retention is
/// the backend's concern. The internal id is unique across live mapping
/// records at the moment of insertion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MappingRecord {
    /// Externally issued identifier (e.g. a gist id)
    pub external_id: String,

    /// Generated identifier substituted for the external one
    pub internal_id: String,

    /// Creation timestamp (unix millis)
    pub created_at: u64,
}

impl MappingRecord {
    /// Create a new association
    pub fn new(external_id: impl Into<String>, internal_id: impl Into<String>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        MappingRecord {
            external_id: external_id.into(),
            internal_id: internal_id.into(),
            created_at: now,
        }
    }
}
