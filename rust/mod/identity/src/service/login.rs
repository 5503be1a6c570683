//! Login and account linking.

use chrono::{DateTime, Utc};
use socialid_core::{new_id, now_utc};
use socialid_kv::WriteTx;
use tracing::{debug, error, info};

use crate::model::{Social, SocialIdentity, User};
use crate::service::codec::{get_social, get_user, put_social, put_user};
use crate::service::slug::slugify;
use crate::service::validate::validate_identity;
use crate::service::{index, IdentityError, IdentityStore};

impl IdentityStore {
    /// Reconcile a verified provider identity with the local users.
    ///
    /// - Known social account: return its owner. Fails with
    ///   `IdentityConflict` if `current_user_id` is some other user.
    /// - Unknown account, nobody signed in: create a user and link it.
    /// - Unknown account, `current_user_id` signed in: link it to that user.
    ///
    /// Runs as one write transaction; on error nothing is written.
    pub fn login(
        &self,
        current_user_id: Option<&str>,
        identity: &SocialIdentity,
    ) -> Result<User, IdentityError> {
        validate_identity(identity).map_err(IdentityError::Validation)?;
        let current_user_id = current_user_id.filter(|id| !id.is_empty());
        let social_id = identity.social_id();

        self.kv.update(|tx| {
            let now = now_utc();
            match get_social(tx, &social_id)? {
                Some(social) => returning_login(tx, social, current_user_id, identity, now),
                None => match current_user_id {
                    None => create_user(tx, identity, now),
                    Some(user_id) => link_social(tx, user_id, identity, now),
                },
            }
        })
    }
}

fn returning_login<W: WriteTx + ?Sized>(
    tx: &mut W,
    mut social: Social,
    current_user_id: Option<&str>,
    identity: &SocialIdentity,
    now: DateTime<Utc>,
) -> Result<User, IdentityError> {
    if let Some(current) = current_user_id {
        if current != social.user_id {
            debug!(
                "social {} belongs to {}, not to signed-in user {}",
                social.id, social.user_id, current
            );
            return Err(IdentityError::IdentityConflict {
                social_id: social.id,
            });
        }
    }

    let Some(user) = get_user(tx, &social.user_id)? else {
        error!("social {} points at missing user {}", social.id, social.user_id);
        return Err(IdentityError::InconsistentState(format!(
            "social '{}' references missing user '{}'",
            social.id, social.user_id
        )));
    };
    if !user.social_ids.contains(&social.id) {
        error!("user {} does not list its social {}", user.id, social.id);
        return Err(IdentityError::InconsistentState(format!(
            "user '{}' does not list social '{}'",
            user.id, social.id
        )));
    }

    if social.refresh(identity, now) {
        debug!("refreshed provider snapshot of {}", social.id);
        put_social(tx, &social)?;
    }
    Ok(user)
}

fn create_user<W: WriteTx + ?Sized>(
    tx: &mut W,
    identity: &SocialIdentity,
    now: DateTime<Utc>,
) -> Result<User, IdentityError> {
    let user_id = new_id();
    let social = Social::new(&user_id, identity, now);

    let candidate = slugify(&format!("{}-{}", identity.nickname, identity.provider_user_id));
    let name = index::available_name(tx, &candidate)?;

    let user = User {
        id: user_id,
        name,
        title: identity.display_name.clone(),
        email: identity.email.clone(),
        social_ids: vec![social.id.clone()],
        inserted: now,
        updated: now,
    };

    put_social(tx, &social)?;
    put_user(tx, &user)?;
    index::insert(tx, &user.name, &user.id)?;

    info!("created user {} ({}) from {}", user.name, user.id, social.id);
    Ok(user)
}

fn link_social<W: WriteTx + ?Sized>(
    tx: &mut W,
    user_id: &str,
    identity: &SocialIdentity,
    now: DateTime<Utc>,
) -> Result<User, IdentityError> {
    let Some(mut user) = get_user(tx, user_id)? else {
        return Err(IdentityError::UnknownUser(user_id.to_string()));
    };

    let social = Social::new(&user.id, identity, now);
    put_social(tx, &social)?;

    user.social_ids.push(social.id.clone());
    user.updated = now;
    put_user(tx, &user)?;

    info!("linked {} to user {} ({})", social.id, user.name, user.id);
    Ok(user)
}
