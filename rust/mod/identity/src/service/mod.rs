pub mod codec;
pub mod index;
pub mod login;
pub mod profile;
pub mod query;
pub mod session;
pub mod slug;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use socialid_kv::{KVError, RedbStore};
use thiserror::Error;
use tracing::warn;

use crate::service::validate::ValidationErrors;

/// userId → JSON User.
pub const USER_BUCKET: &str = "user";
/// socialKey → JSON Social.
pub const SOCIAL_BUCKET: &str = "social";
/// username → userId (raw UTF-8). The unique username index.
pub const USERNAME_INDEX: &str = "i-u-n-u";

/// Every bucket the identity store owns.
pub const BUCKETS: &[&str] = &[USER_BUCKET, SOCIAL_BUCKET, USERNAME_INDEX];

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Callers match on these,
// never on the human-readable message.

pub mod error_code {
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const USERNAME_TAKEN: &str = "USERNAME_TAKEN";
    pub const IDENTITY_CONFLICT: &str = "IDENTITY_CONFLICT";
    pub const UNKNOWN_USER: &str = "UNKNOWN_USER";
    pub const NOT_SIGNED_IN: &str = "NOT_SIGNED_IN";
    pub const INCONSISTENT_STATE: &str = "INCONSISTENT_STATE";
    pub const MISSING_SOCIAL: &str = "MISSING_SOCIAL";
    pub const CODEC_ERROR: &str = "CODEC_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
}

/// Identity store error type.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Input fields failed format rules. Nothing was written.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Requested username belongs to another user. Nothing was written.
    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    /// The social account is linked to a different local user. Nothing was written.
    #[error("social account '{social_id}' is already linked to another user")]
    IdentityConflict { social_id: String },

    /// The caller's user id does not resolve (e.g. a stale session).
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("no user is signed in")]
    NotSignedIn,

    /// A cross-reference between records is broken.
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// A user lists a social key that has no record.
    #[error("missing social record '{0}'")]
    MissingSocial(String),

    #[error("codec: {0}")]
    Codec(String),

    #[error(transparent)]
    Storage(#[from] KVError),
}

impl IdentityError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            IdentityError::Validation(_) => error_code::VALIDATION_FAILED,
            IdentityError::UsernameTaken(_) => error_code::USERNAME_TAKEN,
            IdentityError::IdentityConflict { .. } => error_code::IDENTITY_CONFLICT,
            IdentityError::UnknownUser(_) => error_code::UNKNOWN_USER,
            IdentityError::NotSignedIn => error_code::NOT_SIGNED_IN,
            IdentityError::InconsistentState(_) => error_code::INCONSISTENT_STATE,
            IdentityError::MissingSocial(_) => error_code::MISSING_SOCIAL,
            IdentityError::Codec(_) => error_code::CODEC_ERROR,
            IdentityError::Storage(_) => error_code::STORAGE_ERROR,
        }
    }

    /// True for failures the end user cannot fix: broken invariants and
    /// storage trouble. These should be reported as a generic failure.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            IdentityError::InconsistentState(_)
                | IdentityError::MissingSocial(_)
                | IdentityError::Codec(_)
                | IdentityError::Storage(_)
        )
    }
}

/// The identity store. Owns the `user`, `social` and `i-u-n-u` buckets.
///
/// Every public operation runs as exactly one kv transaction, so the three
/// buckets are never observed out of sync. The handle is `Send + Sync`;
/// share it by reference or `Arc`.
pub struct IdentityStore {
    kv: Arc<RedbStore>,
}

impl IdentityStore {
    /// Open (or create) the database file and its buckets.
    pub fn open(path: &Path) -> Result<Self, IdentityError> {
        let kv = RedbStore::open(path, BUCKETS)?;
        Ok(Self { kv: Arc::new(kv) })
    }

    /// Underlying kv store, e.g. for snapshots.
    pub fn kv(&self) -> &Arc<RedbStore> {
        &self.kv
    }

    /// Close the database. If snapshot workers still hold the kv handle, the
    /// file is released when the last of them lets go.
    pub fn close(self) {
        match Arc::try_unwrap(self.kv) {
            Ok(kv) => kv.close(),
            Err(_) => warn!("kv store still shared at close; it will close with the last handle"),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> (IdentityStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = IdentityStore::open(&dir.path().join("identity.redb")).unwrap();
    (store, dir)
}
