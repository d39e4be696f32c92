//! Durable single-file backend
//!
//! File format:
//! ```text
//! [HEADER: 16 bytes]
//!   - magic: 8 bytes ("DEADDROP")
//!   - version: 4 bytes (u32 LE)
//!   - reserved: 4 bytes
//!
//! [LOG: variable]
//!   - entries, appended in commit order:
//!     - op: 1 byte (0 = insert, 1 = delete)
//!     - len: 4 bytes (u32 LE)
//!     - payload: bincode Record (insert) or RecordKey (delete)
//! ```
//!
//! Live records are indexed in memory by primary key and rebuilt by
//! replaying the log on open. A delete entry tombstones its key, so
//! consumed records stay dead across reopen.

use crate::store::{Attribute, Record, RecordKey, RecordKind, StorageBackend};
use crate::{Error, Result, MAGIC, VERSION};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_SIZE: usize = 16;

const OP_INSERT: u8 = 0;
const OP_DELETE: u8 = 1;

/// Live records of one kind, indexed by primary key
type KindIndex = HashMap<String, Record>;

/// A durable backend persisting records in a single append-only log file
pub struct FileBackend {
    /// Path to the store file
    path: PathBuf,
    /// The file handle, positioned at the append point by each commit
    file: RwLock<File>,
    /// Live records by kind, rebuilt from the log on open
    live: RwLock<HashMap<RecordKind, KindIndex>>,
}

impl FileBackend {
    /// Create a new store file
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[8..12].copy_from_slice(&VERSION.to_le_bytes());
        // reserved: 0
        file.write_all(&header)?;
        file.sync_all()?;

        Ok(FileBackend {
            path,
            file: RwLock::new(file),
            live: RwLock::new(HashMap::new()),
        })
    }

    /// Open an existing store file and replay its log
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        if buf.len() < HEADER_SIZE {
            return Err(Error::InvalidFile("Truncated header".into()));
        }
        if &buf[0..8] != MAGIC {
            return Err(Error::InvalidFile("Invalid magic bytes".into()));
        }
        let version = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        if version != VERSION {
            return Err(Error::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        let live = Self::replay(&buf[HEADER_SIZE..])?;

        Ok(FileBackend {
            path,
            file: RwLock::new(file),
            live: RwLock::new(live),
        })
    }

    /// Open a store file, creating it if absent
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Rebuild the live index from log bytes
    fn replay(mut log: &[u8]) -> Result<HashMap<RecordKind, KindIndex>> {
        let mut live: HashMap<RecordKind, KindIndex> = HashMap::new();

        while !log.is_empty() {
            if log.len() < 5 {
                return Err(Error::Corruption("Truncated log entry header".into()));
            }
            let op = log[0];
            let len = u32::from_le_bytes(log[1..5].try_into().unwrap()) as usize;
            if log.len() < 5 + len {
                return Err(Error::Corruption("Truncated log entry payload".into()));
            }
            let payload = &log[5..5 + len];

            match op {
                OP_INSERT => {
                    let record: Record = bincode::deserialize(payload)?;
                    live.entry(record.kind())
                        .or_default()
                        .insert(record.key().to_string(), record);
                }
                OP_DELETE => {
                    let target: RecordKey = bincode::deserialize(payload)?;
                    if let Some(index) = live.get_mut(&target.kind) {
                        index.remove(&target.key);
                    }
                }
                other => {
                    return Err(Error::Corruption(format!("Unknown log op: {}", other)));
                }
            }

            log = &log[5 + len..];
        }

        Ok(live)
    }

    /// Get the file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn query(&self, kind: RecordKind, attr: Attribute, value: &str) -> Result<Vec<Record>> {
        let live = self.live.read();
        let Some(index) = live.get(&kind) else {
            return Ok(Vec::new());
        };

        // Primary-key lookups hit the index; other attributes scan
        if attr == kind.key_attribute() {
            return Ok(index.get(value).cloned().into_iter().collect());
        }
        Ok(index
            .values()
            .filter(|r| r.attribute(attr) == Some(value))
            .cloned()
            .collect())
    }

    fn commit(&self, inserts: Vec<Record>, deletes: Vec<RecordKey>) -> Result<()> {
        // Serialize the whole batch first so encoding failures abort
        // before any bytes reach the file
        let mut batch = Vec::new();
        for record in &inserts {
            let payload = bincode::serialize(record)?;
            batch.push(OP_INSERT);
            batch.extend((payload.len() as u32).to_le_bytes());
            batch.extend(payload);
        }
        for target in &deletes {
            let payload = bincode::serialize(target)?;
            batch.push(OP_DELETE);
            batch.extend((payload.len() as u32).to_le_bytes());
            batch.extend(payload);
        }

        {
            let mut file = self.file.write();
            file.seek(SeekFrom::End(0))?;
            file.write_all(&batch)?;
            file.sync_all()?;
        }

        let mut live = self.live.write();
        for record in inserts {
            live.entry(record.kind())
                .or_default()
                .insert(record.key().to_string(), record);
        }
        for target in deletes {
            if let Some(index) = live.get_mut(&target.kind) {
                index.remove(&target.key);
            }
        }
        Ok(())
    }

    fn count(&self, kind: RecordKind) -> Result<usize> {
        let live = self.live.read();
        Ok(live.get(&kind).map(|index| index.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleRecord, MappingRecord, StoredField};
    use tempfile::tempdir;

    #[test]
    fn test_create_and_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.drop");

        {
            let backend = FileBackend::create(&path).unwrap();
            assert_eq!(backend.count(RecordKind::Bundle).unwrap(), 0);
        }

        {
            let backend = FileBackend::open(&path).unwrap();
            assert_eq!(backend.count(RecordKind::Bundle).unwrap(), 0);
        }
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.drop");

        {
            let backend = FileBackend::create(&path).unwrap();
            backend
                .commit(
                    vec![
                        Record::Bundle(BundleRecord::new(
                            "abc-123",
                            vec![StoredField {
                                name: "dart".into(),
                                data: vec![1, 2, 3],
                            }],
                        )),
                        Record::Mapping(MappingRecord::new("gist", "internal")),
                    ],
                    Vec::new(),
                )
                .unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        let hits = backend
            .query(RecordKind::Bundle, Attribute::RetrievalId, "abc-123")
            .unwrap();
        assert_eq!(hits.len(), 1);
        let hits = backend
            .query(RecordKind::Mapping, Attribute::InternalId, "internal")
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].attribute(Attribute::ExternalId), Some("gist"));
    }

    #[test]
    fn test_tombstones_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.drop");

        {
            let backend = FileBackend::create(&path).unwrap();
            backend
                .commit(
                    vec![Record::Bundle(BundleRecord::new("doomed", Vec::new()))],
                    Vec::new(),
                )
                .unwrap();
            backend
                .commit(
                    Vec::new(),
                    vec![RecordKey::new(RecordKind::Bundle, "doomed")],
                )
                .unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.count(RecordKind::Bundle).unwrap(), 0);
        let hits = backend
            .query(RecordKind::Bundle, Attribute::RetrievalId, "doomed")
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_non_key_attribute_query_scans() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.drop");
        let backend = FileBackend::create(&path).unwrap();

        backend
            .commit(
                vec![
                    Record::Mapping(MappingRecord::new("same-gist", "int-a")),
                    Record::Mapping(MappingRecord::new("same-gist", "int-b")),
                ],
                Vec::new(),
            )
            .unwrap();

        let hits = backend
            .query(RecordKind::Mapping, Attribute::ExternalId, "same-gist")
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_open_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.drop");
        std::fs::write(&path, b"NOT_A_DEADDROP_FILE_AT_ALL").unwrap();

        match FileBackend::open(&path) {
            Err(Error::InvalidFile(_)) => {}
            other => panic!("expected InvalidFile, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_open_rejects_version_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.drop");

        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[8..12].copy_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, header).unwrap();

        match FileBackend::open(&path) {
            Err(Error::VersionMismatch { expected, found }) => {
                assert_eq!(expected, VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected VersionMismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_truncated_log_is_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("torn.drop");

        {
            let backend = FileBackend::create(&path).unwrap();
            backend
                .commit(
                    vec![Record::Mapping(MappingRecord::new("gist", "internal"))],
                    Vec::new(),
                )
                .unwrap();
        }

        // Tear the last entry mid-payload
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        match FileBackend::open(&path) {
            Err(Error::Corruption(_)) => {}
            other => panic!("expected Corruption, got {:?}", other.map(|_| ())),
        }
    }
}
