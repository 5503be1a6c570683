//! Session-aware wrappers used by the web layer.

use crate::model::{SessionPayload, SocialIdentity, UpdateUser, User};
use crate::service::{IdentityError, IdentityStore};

impl IdentityStore {
    /// Log in (or link) using the session's signed-in user, then store the
    /// resulting user back into the session.
    pub fn login_session<'s>(
        &self,
        session: &'s mut SessionPayload,
        identity: &SocialIdentity,
    ) -> Result<&'s User, IdentityError> {
        let user = self.login(session.current_user_id(), identity)?;
        Ok(session.sign_in(user))
    }

    /// Update the signed-in user's profile and refresh the session copy.
    pub fn update_session_profile<'s>(
        &self,
        session: &'s mut SessionPayload,
        patch: &UpdateUser,
    ) -> Result<&'s User, IdentityError> {
        let Some(current) = session.user.as_ref() else {
            return Err(IdentityError::NotSignedIn);
        };
        let user = self.update_user(current, patch)?;
        Ok(session.sign_in(user))
    }
}
