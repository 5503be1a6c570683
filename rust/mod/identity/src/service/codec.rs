//! JSON encoding of stored records.

use serde::de::DeserializeOwned;
use serde::Serialize;
use socialid_kv::{ReadTx, WriteTx};

use crate::model::{Social, User};
use crate::service::{IdentityError, SOCIAL_BUCKET, USER_BUCKET};

pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, IdentityError> {
    serde_json::to_vec(record).map_err(|e| IdentityError::Codec(format!("serialize: {}", e)))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, IdentityError> {
    serde_json::from_slice(bytes).map_err(|e| IdentityError::Codec(format!("deserialize: {}", e)))
}

fn get_json<T, R>(tx: &R, bucket: &str, key: &str) -> Result<Option<T>, IdentityError>
where
    T: DeserializeOwned,
    R: ReadTx + ?Sized,
{
    match tx.get(bucket, key)? {
        Some(bytes) => Ok(Some(decode(&bytes)?)),
        None => Ok(None),
    }
}

fn put_json<T, W>(tx: &mut W, bucket: &str, key: &str, record: &T) -> Result<(), IdentityError>
where
    T: Serialize,
    W: WriteTx + ?Sized,
{
    let bytes = encode(record)?;
    tx.put(bucket, key, &bytes)?;
    Ok(())
}

pub fn get_user<R: ReadTx + ?Sized>(tx: &R, id: &str) -> Result<Option<User>, IdentityError> {
    get_json(tx, USER_BUCKET, id)
}

pub fn put_user<W: WriteTx + ?Sized>(tx: &mut W, user: &User) -> Result<(), IdentityError> {
    put_json(tx, USER_BUCKET, &user.id, user)
}

pub fn get_social<R: ReadTx + ?Sized>(tx: &R, id: &str) -> Result<Option<Social>, IdentityError> {
    get_json(tx, SOCIAL_BUCKET, id)
}

pub fn put_social<W: WriteTx + ?Sized>(tx: &mut W, social: &Social) -> Result<(), IdentityError> {
    put_json(tx, SOCIAL_BUCKET, &social.id, social)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_json_shape() {
        let now = Utc::now();
        let user = User {
            id: "u1".into(),
            name: "andy-123".into(),
            title: "Andy C".into(),
            email: "a@x.com".into(),
            social_ids: vec!["twitter:123".into()],
            inserted: now,
            updated: now,
        };
        let bytes = encode(&user).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["name"], "andy-123");
        assert_eq!(json["social_ids"][0], "twitter:123");

        let back: User = decode(&bytes).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_decode_garbage_is_codec_error() {
        let err = decode::<User>(b"not json").unwrap_err();
        assert!(matches!(err, IdentityError::Codec(_)));
    }
}
