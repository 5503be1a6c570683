//! The unique username index: `username -> userId` in the `i-u-n-u` bucket.
//!
//! The engine has no secondary indexes, so every change to `User.name` must
//! update this bucket in the same transaction as the user record.

use socialid_kv::{ReadTx, WriteTx};
use tracing::error;

use crate::service::{IdentityError, USERNAME_INDEX};

/// Look up the user id holding `name`.
pub fn lookup<R: ReadTx + ?Sized>(tx: &R, name: &str) -> Result<Option<String>, IdentityError> {
    match tx.get(USERNAME_INDEX, name)? {
        Some(bytes) => {
            let id = String::from_utf8(bytes).map_err(|e| {
                IdentityError::Codec(format!("username index entry '{}': {}", name, e))
            })?;
            Ok(Some(id))
        }
        None => Ok(None),
    }
}

/// Record `name -> user_id`. Fails with `UsernameTaken` if the name is held.
pub fn insert<W: WriteTx + ?Sized>(tx: &mut W, name: &str, user_id: &str) -> Result<(), IdentityError> {
    if lookup(tx, name)?.is_some() {
        return Err(IdentityError::UsernameTaken(name.to_string()));
    }
    tx.put(USERNAME_INDEX, name, user_id.as_bytes())?;
    Ok(())
}

/// Move `user_id` from `old` to `new`.
///
/// Fails with `UsernameTaken` if `new` is held by anyone, and with
/// `InconsistentState` if `old` does not point at `user_id`.
pub fn rename<W: WriteTx + ?Sized>(
    tx: &mut W,
    old: &str,
    new: &str,
    user_id: &str,
) -> Result<(), IdentityError> {
    if lookup(tx, new)?.is_some() {
        return Err(IdentityError::UsernameTaken(new.to_string()));
    }

    match lookup(tx, old)? {
        Some(owner) if owner == user_id => {}
        other => {
            error!(
                "username index entry '{}' is {:?}, expected user {}",
                old, other, user_id
            );
            return Err(IdentityError::InconsistentState(format!(
                "username '{}' is not indexed to user '{}'",
                old, user_id
            )));
        }
    }

    tx.delete(USERNAME_INDEX, old)?;
    tx.put(USERNAME_INDEX, new, user_id.as_bytes())?;
    Ok(())
}

/// First free name among `candidate`, `candidate-2`, `candidate-3`, ...
pub fn available_name<R: ReadTx + ?Sized>(tx: &R, candidate: &str) -> Result<String, IdentityError> {
    if lookup(tx, candidate)?.is_none() {
        return Ok(candidate.to_string());
    }
    let mut n = 2u64;
    loop {
        let name = format!("{}-{}", candidate, n);
        if lookup(tx, &name)?.is_none() {
            return Ok(name);
        }
        n += 1;
    }
}
