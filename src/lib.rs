//! # deaddrop
//!
//! A single-use content relay with gist id mapping.
//!
//! deaddrop persists two kinds of short-lived records on behalf of a
//! client: compressed content bundles retrievable exactly once via a
//! derived identifier, and associations between externally visible gist
//! ids and internally generated ids used to recognize repeated exports of
//! the same content.
//!
//! ## Core Concepts
//!
//! - **Bundles**: named text payloads, compressed and stored for a single
//!   retrieval under an id of the form `<content digest>-<random token>`
//! - **Mappings**: gist id ↔ internal id pairs, with internal ids verified
//!   unused through a bounded retry search
//! - **Backends**: one persistence contract, two implementations: a
//!   durable single-file store and an in-memory substitute
//!
//! ## Example
//!
//! ```ignore
//! use deaddrop::{Bundle, ExportStore, FileBackend};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(FileBackend::open_or_create("relay.drop")?);
//! let exports = ExportStore::new(backend);
//! let id = exports.export(&Bundle::new().with_field("dart", "void main() {}"))?;
//! let bundle = exports.retrieve(&id)?; // consumes the record
//! ```

pub mod codec;
pub mod model;
pub mod store;
pub mod token;

mod error;
mod export;
mod gist;

pub use error::{Error, ErrorClass, Result};
pub use export::ExportStore;
pub use gist::MappingStore;
pub use model::{Bundle, BundleRecord, Field, MappingRecord, StoredField};
pub use store::{
    Attribute, FileBackend, MemoryBackend, Record, RecordKey, RecordKind, StorageBackend,
};

/// Store format version for file compatibility
pub const VERSION: u32 = 1;

/// Magic bytes for file identification
pub const MAGIC: &[u8; 8] = b"DEADDROP";
