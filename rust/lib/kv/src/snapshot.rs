use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::KVError;
use crate::redb::RedbStore;
use crate::traits::ReadTx;

/// One key/value pair in a snapshot file. Values are hex-encoded so any
/// byte string survives the JSON round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub bucket: String,
    pub key: String,
    pub value: String,
}

impl SnapshotRecord {
    /// Decode the stored value back into raw bytes.
    pub fn value_bytes(&self) -> Result<Vec<u8>, KVError> {
        hex::decode(&self.value).map_err(|e| KVError::Serialization(e.to_string()))
    }
}

/// Summary of a written snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    pub entries: u64,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
}

impl RedbStore {
    /// Write a point-in-time copy of every bucket to `path`.
    ///
    /// All buckets are read inside a single read transaction, so the file is
    /// consistent even while writers keep committing. Format: one JSON
    /// [`SnapshotRecord`] per line, buckets in open order and keys sorted,
    /// compressed with zstd. Never overwrites: fails if `path` exists.
    pub fn write_snapshot(&self, path: &Path) -> Result<SnapshotStats, KVError> {
        let (raw, entries) = self.view(|tx| {
            let mut raw = Vec::new();
            let mut entries = 0u64;
            for bucket in &self.buckets {
                for (key, value) in tx.scan(bucket, "")? {
                    let record = SnapshotRecord {
                        bucket: bucket.clone(),
                        key,
                        value: hex::encode(value),
                    };
                    serde_json::to_writer(&mut raw, &record)
                        .map_err(|e| KVError::Serialization(e.to_string()))?;
                    raw.push(b'\n');
                    entries += 1;
                }
            }
            Ok::<_, KVError>((raw, entries))
        })?;

        let uncompressed_size = raw.len() as u64;
        let compressed = zstd::encode_all(raw.as_slice(), 3)
            .map_err(|e| KVError::Io(e.to_string()))?;
        let compressed_size = compressed.len() as u64;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KVError::Io(e.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| KVError::Io(format!("{}: {}", path.display(), e)))?;
        file.write_all(&compressed)
            .and_then(|_| file.sync_all())
            .map_err(|e| KVError::Io(e.to_string()))?;

        info!(
            "snapshot {:?}: {} entries, {} -> {} bytes",
            path, entries, uncompressed_size, compressed_size
        );
        Ok(SnapshotStats {
            entries,
            uncompressed_size,
            compressed_size,
        })
    }
}

/// Read a snapshot file written by [`RedbStore::write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Vec<SnapshotRecord>, KVError> {
    let compressed = fs::read(path).map_err(|e| KVError::Io(e.to_string()))?;
    let raw = zstd::decode_all(compressed.as_slice()).map_err(|e| KVError::Io(e.to_string()))?;

    let mut records = Vec::new();
    for line in raw.split(|b| *b == b'\n') {
        if line.is_empty() {
            continue;
        }
        let record: SnapshotRecord = serde_json::from_slice(line)
            .map_err(|e| KVError::Serialization(e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::WriteTx;

    #[test]
    fn snapshot_contains_every_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("db.redb"), &["users", "index"]).unwrap();

        store
            .update(|tx| {
                tx.put("users", "u1", br#"{"name":"a"}"#)?;
                tx.put("users", "u2", br#"{"name":"b"}"#)?;
                tx.put("index", "a", &[0xff, 0x00, 0x7f])
            })
            .unwrap();

        let path = dir.path().join("dumps").join("snap.jsonl.zst");
        let stats = store.write_snapshot(&path).unwrap();
        assert_eq!(stats.entries, 3);
        assert!(stats.compressed_size > 0);

        let records = read_snapshot(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].bucket, "users");
        assert_eq!(records[0].key, "u1");
        assert_eq!(records[2].bucket, "index");
        assert_eq!(records[2].value_bytes().unwrap(), vec![0xff, 0x00, 0x7f]);
    }

    #[test]
    fn existing_snapshot_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("db.redb"), &["users"]).unwrap();
        store.update(|tx| tx.put("users", "u1", b"{}")).unwrap();

        let path = dir.path().join("snap.jsonl.zst");
        store.write_snapshot(&path).unwrap();
        store.update(|tx| tx.put("users", "u2", b"{}")).unwrap();

        let err = store.write_snapshot(&path).unwrap_err();
        assert!(matches!(err, KVError::Io(_)));
        assert_eq!(read_snapshot(&path).unwrap().len(), 1);
    }

    #[test]
    fn empty_store_writes_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("db.redb"), &["only"]).unwrap();

        let path = dir.path().join("empty.jsonl.zst");
        let stats = store.write_snapshot(&path).unwrap();
        assert_eq!(stats.entries, 0);
        assert!(read_snapshot(&path).unwrap().is_empty());
    }
}
