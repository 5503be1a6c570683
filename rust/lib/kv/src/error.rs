use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("storage error: {0}")]
    Storage(String),

    /// Another process holds the database file.
    #[error("database already open by another process: {0}")]
    AlreadyOpen(String),

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Map any engine error into `KVError::Storage`.
pub(crate) fn storage<E: std::fmt::Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}
