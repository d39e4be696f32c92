//! Gist mapping store - external id to internal id associations

use crate::model::MappingRecord;
use crate::store::{Attribute, Record, RecordKind, StorageBackend};
use crate::token;
use crate::{Error, Result};
use std::sync::Arc;

/// Persists and resolves gist id associations
///
/// Internal ids stand in for externally issued gist ids so repeated exports
/// of the same content can be recognized without exposing the external id.
pub struct MappingStore {
    backend: Arc<dyn StorageBackend>,
}

impl MappingStore {
    /// Create a mapping store over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        MappingStore { backend }
    }

    /// Generate an internal id verified unused at generation time
    ///
    /// Candidates colliding with stored mappings are retried a bounded
    /// number of times; exhaustion surfaces as `ExhaustedRetries`.
    pub fn generate_unused_id(&self) -> Result<String> {
        token::unique_token(|candidate| {
            Ok(!self
                .backend
                .query(RecordKind::Mapping, Attribute::InternalId, candidate)?
                .is_empty())
        })
    }

    /// Associate an external gist id with an internal id, echoing the
    /// external id on success
    ///
    /// Internal ids must not be reused: an existing mapping with this
    /// internal id fails with `Conflict` even when the external id differs.
    /// The check and the insert are separate backend calls; the backend
    /// offers no uniqueness primitive, so two concurrent stores can both
    /// pass the check.
    pub fn store(&self, external_id: &str, internal_id: &str) -> Result<String> {
        let existing = self
            .backend
            .query(RecordKind::Mapping, Attribute::InternalId, internal_id)?;
        if !existing.is_empty() {
            return Err(Error::Conflict(format!(
                "mapping invalid: internal id {} already in use",
                internal_id
            )));
        }

        let record = MappingRecord::new(external_id, internal_id);
        self.backend
            .commit(vec![Record::Mapping(record)], Vec::new())?;

        tracing::debug!(external_id, internal_id, "mapping stored");
        Ok(external_id.to_string())
    }

    /// Look up the external gist id for an internal id
    pub fn resolve(&self, internal_id: &str) -> Result<String> {
        if internal_id.is_empty() {
            return Err(Error::BadRequest("missing internal id".into()));
        }

        let mut hits = self
            .backend
            .query(RecordKind::Mapping, Attribute::InternalId, internal_id)?;
        match hits.pop() {
            Some(Record::Mapping(record)) => Ok(record.external_id),
            _ => Err(Error::NotFound(internal_id.to_string())),
        }
    }
}
