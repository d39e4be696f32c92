//! Bundle types - the unit of single-use export

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

/// A named text payload within a bundle
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub text: String,
}

/// A set of named text payloads submitted together for export
///
/// Field order is significant: it fixes the order used for the content
/// fingerprint, and retrieval returns fields in the order they were
/// exported.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Bundle {
    /// Named payloads, in submission order
    pub fields: Vec<Field>,

    /// Retrieval id: set on bundles returned by retrieval. A caller-supplied
    /// id on export input is ignored; every export gets a fresh id.
    pub id: Option<String>,
}

impl Bundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Bundle::default()
    }

    /// Append a named field
    pub fn with_field(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    /// Look up a field's text by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.text.as_str())
    }

    /// SHA-1 fingerprint of the bundle's content
    ///
    /// Field values are concatenated with single-space separators in field
    /// order, so identical content always yields the same 40-hex-char
    /// digest. The digest forms the inspectable prefix of retrieval ids.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha1::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                hasher.update(b" ");
            }
            hasher.update(field.text.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A compressed field as persisted inside a [`BundleRecord`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredField {
    pub name: String,
    pub data: Vec<u8>,
}

/// A stored export
///
/// Created on export, destroyed on first successful retrieval, never
/// mutated. The retrieval id is unique across all live bundle records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BundleRecord {
    /// Single-use lookup key: `<content digest>-<random token>`
    pub retrieval_id: String,

    /// Compressed payloads, in submission order
    pub fields: Vec<StoredField>,

    /// Creation timestamp (unix millis)
    pub created_at: u64,
}

impl BundleRecord {
    /// Create a record with the given retrieval id and stored fields
    pub fn new(retrieval_id: impl Into<String>, fields: Vec<StoredField>) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as u64;

        BundleRecord {
            retrieval_id: retrieval_id.into(),
            fields,
            created_at: now,
        }
    }
}
