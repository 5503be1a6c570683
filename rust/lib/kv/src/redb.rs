use std::path::{Path, PathBuf};

use redb::{Database, DatabaseError, ReadableTable, TableDefinition};
use tracing::{debug, info, warn};

use crate::error::{storage, KVError};
use crate::traits::{ReadTx, WriteTx};

fn table_def(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

/// RedbStore is a bucketed key-value store backed by redb — a pure-Rust
/// embedded database with a single file, ACID transactions, any number of
/// concurrent readers and a single writer.
///
/// Each bucket is a redb table of `&str -> &[u8]`. The set of buckets is
/// fixed when the store is opened; touching any other bucket fails with
/// `KVError::BucketNotFound`.
pub struct RedbStore {
    pub(crate) db: Database,
    pub(crate) buckets: Vec<String>,
    path: PathBuf,
}

impl RedbStore {
    /// Open or create a redb database at the given path and make sure every
    /// bucket exists.
    ///
    /// Fails immediately if another process already holds the file.
    pub fn open(path: &Path, buckets: &[&str]) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(|e| match e {
            DatabaseError::DatabaseAlreadyOpen => KVError::AlreadyOpen(path.display().to_string()),
            other => storage(other),
        })?;

        // Create missing tables up front so read transactions never see a
        // bucket that does not exist yet.
        let write_txn = db.begin_write().map_err(storage)?;
        for name in buckets {
            write_txn.open_table(table_def(name)).map_err(storage)?;
        }
        write_txn.commit().map_err(storage)?;

        info!("opened kv store {:?} with buckets {:?}", path, buckets);
        Ok(Self {
            db,
            buckets: buckets.iter().map(|b| b.to_string()).collect(),
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bucket names this store was opened with.
    pub fn buckets(&self) -> &[String] {
        &self.buckets
    }

    /// Run `f` inside a read-only transaction.
    ///
    /// Readers never block each other and never block the writer.
    pub fn view<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&RedbReadTx<'_>) -> Result<T, E>,
        E: From<KVError>,
    {
        let txn = self.db.begin_read().map_err(storage)?;
        let tx = RedbReadTx {
            txn,
            buckets: &self.buckets,
        };
        f(&tx)
    }

    /// Run `f` inside a read-write transaction.
    ///
    /// Commits when `f` returns `Ok`, aborts when it returns `Err`, so a
    /// failed body never leaves partial writes behind. Only one write
    /// transaction is active at a time; others wait in `begin_write`.
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut RedbWriteTx<'_>) -> Result<T, E>,
        E: From<KVError>,
    {
        let txn = self.db.begin_write().map_err(storage)?;
        let mut tx = RedbWriteTx {
            txn,
            buckets: &self.buckets,
        };

        match f(&mut tx) {
            Ok(value) => {
                tx.txn.commit().map_err(storage)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = tx.txn.abort() {
                    warn!("failed to abort write transaction: {}", abort_err);
                }
                debug!("write transaction rolled back");
                Err(e)
            }
        }
    }

    /// Close the database, releasing the file lock.
    pub fn close(self) {
        let path = self.path.clone();
        drop(self.db);
        info!("closed kv store {:?}", path);
    }
}

fn check_bucket(buckets: &[String], bucket: &str) -> Result<(), KVError> {
    if buckets.iter().any(|b| b == bucket) {
        Ok(())
    } else {
        Err(KVError::BucketNotFound(bucket.to_string()))
    }
}

fn read_value<T>(table: &T, key: &str) -> Result<Option<Vec<u8>>, KVError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let value = table.get(key).map_err(storage)?;
    Ok(value.map(|guard| guard.value().to_vec()))
}

fn scan_prefix<T>(table: &T, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.range(prefix..).map_err(storage)? {
        let (key, value) = entry.map_err(storage)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        results.push((key.to_string(), value.value().to_vec()));
    }
    Ok(results)
}

/// A read-only transaction over a [`RedbStore`].
pub struct RedbReadTx<'s> {
    txn: redb::ReadTransaction,
    buckets: &'s [String],
}

impl ReadTx for RedbReadTx<'_> {
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        check_bucket(self.buckets, bucket)?;
        let table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        read_value(&table, key)
    }

    fn scan(&self, bucket: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        check_bucket(self.buckets, bucket)?;
        let table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        scan_prefix(&table, prefix)
    }
}

/// A read-write transaction over a [`RedbStore`].
pub struct RedbWriteTx<'s> {
    txn: redb::WriteTransaction,
    buckets: &'s [String],
}

impl ReadTx for RedbWriteTx<'_> {
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        check_bucket(self.buckets, bucket)?;
        let table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        read_value(&table, key)
    }

    fn scan(&self, bucket: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        check_bucket(self.buckets, bucket)?;
        let table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        scan_prefix(&table, prefix)
    }
}

impl WriteTx for RedbWriteTx<'_> {
    fn put(&mut self, bucket: &str, key: &str, value: &[u8]) -> Result<(), KVError> {
        check_bucket(self.buckets, bucket)?;
        let mut table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        table.insert(key, value).map_err(storage)?;
        Ok(())
    }

    fn delete(&mut self, bucket: &str, key: &str) -> Result<bool, KVError> {
        check_bucket(self.buckets, bucket)?;
        let mut table = self.txn.open_table(table_def(bucket)).map_err(storage)?;
        let removed = table.remove(key).map_err(storage)?.is_some();
        Ok(removed)
    }
}
