//! Export store - single-use bundle persistence
//!
//! An export compresses a bundle's fields, derives a retrieval id from the
//! content fingerprint plus a random token, and persists the record. The
//! first successful retrieval consumes the record; the id is dead
//! afterwards.

use crate::codec;
use crate::model::{Bundle, BundleRecord, StoredField};
use crate::store::{Attribute, Record, RecordKey, RecordKind, StorageBackend};
use crate::token;
use crate::{Error, Result};
use std::sync::Arc;

/// Persists and serves single-use content bundles
pub struct ExportStore {
    backend: Arc<dyn StorageBackend>,
}

impl ExportStore {
    /// Create an export store over the given backend
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        ExportStore { backend }
    }

    /// Persist a bundle and return its retrieval id
    ///
    /// The id has the form `<40-hex content digest>-<random token>`. The
    /// random suffix makes ids from identical content distinct (every
    /// export is a new single-use record) while the digest prefix stays
    /// inspectable for correlating repeated content. The id is returned
    /// only after the insert has committed.
    pub fn export(&self, bundle: &Bundle) -> Result<String> {
        let mut stored = Vec::with_capacity(bundle.fields.len());
        for field in &bundle.fields {
            stored.push(StoredField {
                name: field.name.clone(),
                data: codec::encode(&field.text)?,
            });
        }

        let retrieval_id = format!("{}-{}", bundle.fingerprint(), token::new_token());
        let record = BundleRecord::new(retrieval_id.clone(), stored);

        if let Err(e) = self.backend.commit(vec![Record::Bundle(record)], Vec::new()) {
            tracing::error!(retrieval_id = %retrieval_id, error = %e, "failed to persist export");
            return Err(e);
        }

        tracing::debug!(retrieval_id = %retrieval_id, "bundle exported");
        Ok(retrieval_id)
    }

    /// Fetch and consume a bundle by retrieval id
    ///
    /// A second retrieval with the same id fails with `NotFound`. The
    /// delete is cleanup, not a precondition: if it fails, the failure is
    /// logged and the already-read content is still returned.
    pub fn retrieve(&self, retrieval_id: &str) -> Result<Bundle> {
        let mut hits =
            self.backend
                .query(RecordKind::Bundle, Attribute::RetrievalId, retrieval_id)?;
        let record = match hits.pop() {
            Some(Record::Bundle(record)) => record,
            _ => return Err(Error::NotFound(retrieval_id.to_string())),
        };

        let mut bundle = Bundle::new();
        for field in &record.fields {
            bundle = bundle.with_field(&field.name, codec::decode(&field.data)?);
        }
        bundle.id = Some(record.retrieval_id.clone());

        let key = RecordKey::new(RecordKind::Bundle, &record.retrieval_id);
        if let Err(e) = self.backend.commit(Vec::new(), vec![key]) {
            tracing::warn!(retrieval_id = %retrieval_id, error = %e, "failed to delete bundle after retrieval");
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;

    fn export_store() -> ExportStore {
        ExportStore::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn test_export_id_format() {
        let store = export_store();
        let bundle = Bundle::new().with_field("dart", "void main() {}");
        let id = store.export(&bundle).unwrap();

        let digest = &id[..40];
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.as_bytes()[40], b'-');
        assert_eq!(digest, bundle.fingerprint());
    }

    #[test]
    fn test_identical_content_gets_distinct_ids() {
        let store = export_store();
        let bundle = Bundle::new().with_field("dart", "void main() {}");

        let first = store.export(&bundle).unwrap();
        let second = store.export(&bundle).unwrap();

        assert_ne!(first, second);
        // Same content, same inspectable digest prefix
        assert_eq!(&first[..40], &second[..40]);
    }

    #[test]
    fn test_retrieve_roundtrip_and_single_use() {
        let store = export_store();
        let bundle = Bundle::new()
            .with_field("dart", "void main() {}")
            .with_field("html", "")
            .with_field("css", "body { color: red }");

        let id = store.export(&bundle).unwrap();

        let retrieved = store.retrieve(&id).unwrap();
        assert_eq!(retrieved.field("dart"), Some("void main() {}"));
        assert_eq!(retrieved.field("html"), Some(""));
        assert_eq!(retrieved.field("css"), Some("body { color: red }"));
        assert_eq!(retrieved.id.as_deref(), Some(id.as_str()));

        match store.retrieve(&id) {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_retrieve_unknown_id() {
        let store = export_store();
        assert!(matches!(
            store.retrieve("deadbeef-0000"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_caller_supplied_id_is_ignored() {
        let store = export_store();
        let mut bundle = Bundle::new().with_field("dart", "x");
        bundle.id = Some("stale-previous-id".into());

        let id = store.export(&bundle).unwrap();
        assert_ne!(id, "stale-previous-id");
        assert!(matches!(
            store.retrieve("stale-previous-id"),
            Err(Error::NotFound(_))
        ));
    }
}
