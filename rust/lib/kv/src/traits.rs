use crate::error::KVError;

/// Read access inside a transaction.
///
/// Keys live in named buckets and are ordered lexicographically. Every read
/// made through one `ReadTx` observes the same committed snapshot.
pub trait ReadTx {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Scan all keys in a bucket matching a prefix. Returns sorted (key, value) pairs.
    fn scan(&self, bucket: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}

/// Write access inside a read-write transaction.
///
/// Writes become visible to other transactions only when the enclosing
/// transaction commits. Reads through the same `WriteTx` see its own
/// uncommitted writes.
pub trait WriteTx: ReadTx {
    /// Insert or overwrite a key.
    fn put(&mut self, bucket: &str, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Remove a key. Returns true if the key existed.
    fn delete(&mut self, bucket: &str, key: &str) -> Result<bool, KVError>;
}
