//! In-memory backend for tests and degraded operation

use crate::store::{Attribute, Record, RecordKey, RecordKind, StorageBackend};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A volatile backend holding records grouped by kind tag
///
/// Queries are linear scans by attribute equality. Nothing survives the
/// process; use [`FileBackend`](crate::store::FileBackend) for durability.
#[derive(Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<RecordKind, Vec<Record>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn query(&self, kind: RecordKind, attr: Attribute, value: &str) -> Result<Vec<Record>> {
        let records = self.records.read();
        let hits = records
            .get(&kind)
            .map(|group| {
                group
                    .iter()
                    .filter(|r| r.attribute(attr) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(hits)
    }

    fn commit(&self, inserts: Vec<Record>, deletes: Vec<RecordKey>) -> Result<()> {
        let mut records = self.records.write();
        for record in inserts {
            records.entry(record.kind()).or_default().push(record);
        }
        for target in deletes {
            if let Some(group) = records.get_mut(&target.kind) {
                group.retain(|r| r.key() != target.key);
            }
        }
        Ok(())
    }

    fn count(&self, kind: RecordKind) -> Result<usize> {
        let records = self.records.read();
        Ok(records.get(&kind).map(|group| group.len()).unwrap_or(0))
    }
}
