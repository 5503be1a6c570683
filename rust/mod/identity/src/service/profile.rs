use socialid_core::now_utc;
use tracing::info;

use crate::model::{UpdateUser, User};
use crate::service::codec::{get_user, put_user};
use crate::service::validate::{validate_update, validate_username};
use crate::service::{index, IdentityError, IdentityStore};

impl IdentityStore {
    /// Apply a profile patch to the signed-in user.
    ///
    /// The patch is trimmed and validated before storage is touched. Name
    /// rules only apply when the name changes. A new name moves the user's
    /// username index entry in the same transaction that rewrites the record.
    pub fn update_user(&self, current_user: &User, patch: &UpdateUser) -> Result<User, IdentityError> {
        let patch = patch.normalized();
        validate_update(&patch, &current_user.name).map_err(IdentityError::Validation)?;

        self.kv.update(|tx| {
            let Some(mut user) = get_user(tx, &current_user.id)? else {
                return Err(IdentityError::UnknownUser(current_user.id.clone()));
            };

            if patch.name != user.name {
                // `current_user` may be stale; the stored name decides.
                if patch.name == current_user.name {
                    validate_username(&patch.name).map_err(IdentityError::Validation)?;
                }
                index::rename(tx, &user.name, &patch.name, &user.id)?;
                info!("user {} renamed {} -> {}", user.id, user.name, patch.name);
                user.name = patch.name.clone();
            }

            user.title = patch.title.clone();
            user.email = patch.email.clone();
            user.updated = now_utc();
            put_user(tx, &user)?;
            Ok(user)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SocialIdentity;
    use crate::service::test_store;

    fn sign_up(store: &IdentityStore, provider: &str, id: &str, nick: &str) -> User {
        let identity = SocialIdentity::new(provider, id, nick, nick, format!("{}@x.com", nick));
        store.login(None, &identity).unwrap()
    }

    #[test]
    fn test_rename_round_trip() {
        let (store, _dir) = test_store();
        let user = sign_up(&store, "twitter", "123", "andy");

        let patch = UpdateUser::new("andrew", "Andrew C", "andrew@x.com");
        let updated = store.update_user(&user, &patch).unwrap();
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.name, "andrew");
        assert_eq!(updated.title, "Andrew C");
        assert_eq!(updated.email, "andrew@x.com");
        assert_eq!(updated.social_ids, user.social_ids);
        assert_eq!(updated.inserted, user.inserted);
        assert!(updated.updated >= user.updated);

        assert_eq!(store.get_user_by_username("andrew").unwrap(), Some(updated));
        assert_eq!(store.get_user_by_username("andy-123").unwrap(), None);
    }

    #[test]
    fn test_same_name_keeps_index() {
        let (store, _dir) = test_store();
        let user = sign_up(&store, "twitter", "123", "andy");

        let patch = UpdateUser::new("andy-123", "New Title", "a@x.com");
        let updated = store.update_user(&user, &patch).unwrap();
        assert_eq!(updated.title, "New Title");
        assert_eq!(
            store.get_user_by_username("andy-123").unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[test]
    fn test_rename_onto_taken_name() {
        let (store, _dir) = test_store();
        let alice = sign_up(&store, "twitter", "1", "alice");
        let bob = sign_up(&store, "twitter", "2", "bob");

        let patch = UpdateUser::new(bob.name.clone(), "Alice", "alice@x.com");
        let err = store.update_user(&alice, &patch).unwrap_err();
        assert!(matches!(err, IdentityError::UsernameTaken(ref n) if *n == bob.name));
        assert_eq!(err.error_code(), "USERNAME_TAKEN");

        assert_eq!(store.get_user(&alice.id).unwrap(), Some(alice.clone()));
        assert_eq!(store.get_user(&bob.id).unwrap(), Some(bob.clone()));
        assert_eq!(store.get_user_by_username(&alice.name).unwrap(), Some(alice));
        assert_eq!(store.get_user_by_username(&bob.name).unwrap(), Some(bob));
    }

    #[test]
    fn test_patch_is_trimmed() {
        let (store, _dir) = test_store();
        let user = sign_up(&store, "twitter", "123", "andy");

        let patch = UpdateUser::new("  andy-c ", " Andy ", " a@x.com\n");
        let updated = store.update_user(&user, &patch).unwrap();
        assert_eq!(updated.name, "andy-c");
        assert_eq!(updated.title, "Andy");
        assert_eq!(updated.email, "a@x.com");
    }

    #[test]
    fn test_invalid_patch_touches_nothing() {
        let (store, _dir) = test_store();
        let user = sign_up(&store, "twitter", "123", "andy");

        let patch = UpdateUser::new("A", "", "not-an-email");
        let err = store.update_user(&user, &patch).unwrap_err();
        let IdentityError::Validation(errors) = &err else {
            panic!("expected validation error, got {:?}", err);
        };
        assert_eq!(errors.errors().len(), 3);
        assert_eq!(store.get_user(&user.id).unwrap(), Some(user));
    }

    #[test]
    fn test_generated_name_starting_with_digit_can_edit_profile() {
        let (store, _dir) = test_store();
        let user = store
            .login(None, &SocialIdentity::new("twitter", "123", "", "Anon", "a@x.com"))
            .unwrap();
        assert_eq!(user.name, "123");

        let patch = UpdateUser::new(user.name.clone(), "New", "new@x.com");
        let updated = store.update_user(&user, &patch).unwrap();
        assert_eq!(updated.name, "123");
        assert_eq!(updated.title, "New");
        assert_eq!(updated.email, "new@x.com");
        assert_eq!(store.get_user_by_username("123").unwrap(), Some(updated));
    }

    #[test]
    fn test_generated_long_name_can_edit_profile() {
        let (store, _dir) = test_store();
        let identity = SocialIdentity::new(
            "google",
            "109876543210987654321",
            "averyveryverylongnickname",
            "Long",
            "l@x.com",
        );
        let user = store.login(None, &identity).unwrap();
        assert!(user.name.len() > 32);

        let patch = UpdateUser::new(user.name.clone(), "Shorter", "l@x.com");
        let updated = store.update_user(&user, &patch).unwrap();
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.title, "Shorter");

        // Moving to another name still goes through the rules.
        let err = store
            .update_user(&updated, &UpdateUser::new("9lives", "Shorter", "l@x.com"))
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
    }

    #[test]
    fn test_stale_current_user_name_is_still_checked() {
        let (store, _dir) = test_store();
        let user = sign_up(&store, "twitter", "123", "andy");

        let mut stale = user.clone();
        stale.name = "Not Valid".into();
        let err = store
            .update_user(&stale, &UpdateUser::new("Not Valid", "Andy", "a@x.com"))
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
        assert_eq!(store.get_user(&user.id).unwrap(), Some(user));
    }

    #[test]
    fn test_unknown_user() {
        let (store, _dir) = test_store();
        let mut ghost = sign_up(&store, "twitter", "123", "andy");
        ghost.id = "missing".into();

        let err = store
            .update_user(&ghost, &UpdateUser::new("ghost", "Ghost", "g@x.com"))
            .unwrap_err();
        assert!(matches!(err, IdentityError::UnknownUser(_)));
        assert_eq!(store.get_user_by_username("ghost").unwrap(), None);
    }
}
