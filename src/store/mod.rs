//! Record storage
//!
//! This module defines the persistence contract the relay runs against:
//! query records of a kind by attribute equality, and commit batches of
//! inserts and deletes. Two interchangeable backends implement it: a
//! durable single-file store and an in-memory substitute. Business logic
//! holds a [`StorageBackend`] trait object chosen at construction time and
//! never branches on which one is active.

mod file_store;
mod memory;

pub use file_store::FileBackend;
pub use memory::MemoryBackend;

use crate::model::{BundleRecord, MappingRecord};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Tag for the kinds of records the relay persists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// A single-use export
    Bundle,
    /// A gist id association
    Mapping,
}

impl RecordKind {
    /// The attribute holding this kind's primary key
    pub fn key_attribute(&self) -> Attribute {
        match self {
            RecordKind::Bundle => Attribute::RetrievalId,
            RecordKind::Mapping => Attribute::InternalId,
        }
    }
}

/// Queryable record attributes, matched by exact equality
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    RetrievalId,
    InternalId,
    ExternalId,
}

/// A stored record of either kind
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Record {
    Bundle(BundleRecord),
    Mapping(MappingRecord),
}

impl Record {
    /// The kind tag for this record
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Bundle(_) => RecordKind::Bundle,
            Record::Mapping(_) => RecordKind::Mapping,
        }
    }

    /// The record's primary key within its kind
    pub fn key(&self) -> &str {
        match self {
            Record::Bundle(r) => &r.retrieval_id,
            Record::Mapping(r) => &r.internal_id,
        }
    }

    /// The value of a queryable attribute, if this kind carries it
    pub fn attribute(&self, attr: Attribute) -> Option<&str> {
        match (self, attr) {
            (Record::Bundle(r), Attribute::RetrievalId) => Some(&r.retrieval_id),
            (Record::Mapping(r), Attribute::InternalId) => Some(&r.internal_id),
            (Record::Mapping(r), Attribute::ExternalId) => Some(&r.external_id),
            _ => None,
        }
    }

    /// The key that addresses this record for deletion
    pub fn storage_key(&self) -> RecordKey {
        RecordKey {
            kind: self.kind(),
            key: self.key().to_string(),
        }
    }
}

/// Addresses a single record for deletion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKey {
    pub kind: RecordKind,
    pub key: String,
}

impl RecordKey {
    pub fn new(kind: RecordKind, key: impl Into<String>) -> Self {
        RecordKey {
            kind,
            key: key.into(),
        }
    }
}

/// Persistence capability: query by attribute equality, commit inserts and
/// deletes
///
/// Implementations must be drop-in substitutable; ordering of query results
/// is only stable within one backend. Atomicity of `commit` is best-effort.
pub trait StorageBackend: Send + Sync {
    /// All live records of `kind` whose `attr` equals `value`
    fn query(&self, kind: RecordKind, attr: Attribute, value: &str) -> Result<Vec<Record>>;

    /// Apply a batch of insertions and deletions
    fn commit(&self, inserts: Vec<Record>, deletes: Vec<RecordKey>) -> Result<()>;

    /// Number of live records of `kind`
    fn count(&self, kind: RecordKind) -> Result<usize>;
}
