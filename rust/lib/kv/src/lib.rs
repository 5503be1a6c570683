//! Bucketed, transactional key-value storage.
//!
//! A single redb file holds a fixed set of named buckets. All access goes
//! through [`RedbStore::view`] (read-only) or [`RedbStore::update`]
//! (read-write) so multi-key changes commit or roll back together.

pub mod error;
pub mod redb;
pub mod snapshot;
pub mod traits;

pub use error::KVError;
pub use crate::redb::{RedbReadTx, RedbStore, RedbWriteTx};
pub use snapshot::{read_snapshot, SnapshotRecord, SnapshotStats};
pub use traits::{ReadTx, WriteTx};
