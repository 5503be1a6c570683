//! Read-only lookups.

use tracing::error;

use crate::model::{Social, User};
use crate::service::codec::{get_social, get_user};
use crate::service::{index, IdentityError, IdentityStore};

impl IdentityStore {
    /// Resolve a username through the index. `None` if nobody holds it.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, IdentityError> {
        self.kv.view(|tx| {
            let Some(user_id) = index::lookup(tx, username)? else {
                return Ok(None);
            };
            match get_user(tx, &user_id)? {
                Some(user) => Ok(Some(user)),
                None => {
                    error!("username {} indexed to missing user {}", username, user_id);
                    Err(IdentityError::InconsistentState(format!(
                        "username '{}' references missing user '{}'",
                        username, user_id
                    )))
                }
            }
        })
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, IdentityError> {
        self.kv.view(|tx| get_user(tx, id))
    }

    /// Load the social records for `social_ids`, in order.
    pub fn list_socials(&self, social_ids: &[String]) -> Result<Vec<Social>, IdentityError> {
        self.kv.view(|tx| {
            let mut socials = Vec::with_capacity(social_ids.len());
            for id in social_ids {
                match get_social(tx, id)? {
                    Some(social) => socials.push(social),
                    None => {
                        error!("social {} is listed but has no record", id);
                        return Err(IdentityError::MissingSocial(id.clone()));
                    }
                }
            }
            Ok(socials)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SocialIdentity;
    use crate::service::test_store;
    use socialid_kv::WriteTx;

    #[test]
    fn test_unknown_username() {
        let (store, _dir) = test_store();
        assert_eq!(store.get_user_by_username("nobody").unwrap(), None);
        assert_eq!(store.get_user("nobody").unwrap(), None);
    }

    #[test]
    fn test_dangling_index_entry() {
        let (store, _dir) = test_store();
        store
            .kv()
            .update(|tx| index::insert(tx, "ghost", "u404"))
            .unwrap();

        let err = store.get_user_by_username("ghost").unwrap_err();
        assert!(matches!(err, IdentityError::InconsistentState(_)));
    }

    #[test]
    fn test_list_socials_in_order() {
        let (store, _dir) = test_store();
        let user = store
            .login(None, &SocialIdentity::new("twitter", "1", "a", "A", "a@x.com"))
            .unwrap();
        let user = store
            .login(
                Some(user.id.as_str()),
                &SocialIdentity::new("github", "2", "a", "A", "a@x.com"),
            )
            .unwrap();

        let ids: Vec<String> = store
            .list_socials(&user.social_ids)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["twitter:1", "github:2"]);

        let reversed: Vec<String> = user.social_ids.iter().rev().cloned().collect();
        let socials = store.list_socials(&reversed).unwrap();
        assert_eq!(socials[0].id, "github:2");

        assert!(store.list_socials(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_social() {
        let (store, _dir) = test_store();
        let user = store
            .login(None, &SocialIdentity::new("twitter", "1", "a", "A", "a@x.com"))
            .unwrap();
        store
            .kv()
            .update(|tx| tx.delete(crate::service::SOCIAL_BUCKET, "twitter:1"))
            .unwrap();

        let err = store.list_socials(&user.social_ids).unwrap_err();
        assert!(matches!(err, IdentityError::MissingSocial(ref id) if id == "twitter:1"));
        assert_eq!(err.error_code(), "MISSING_SOCIAL");
    }
}
