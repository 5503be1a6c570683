use serde::{Deserialize, Serialize};

use crate::model::User;

/// What the web layer keeps in its session cookie.
///
/// The signed-in user is an explicit optional field rather than an entry in
/// an untyped map, so reading it never needs a runtime cast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl SessionPayload {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Id of the signed-in user, if any.
    pub fn current_user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// Replace the session's user, returning a reference to it.
    pub fn sign_in(&mut self, user: User) -> &User {
        self.user.insert(user)
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }
}
