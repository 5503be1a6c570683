use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Build the social key for a provider account: `"<provider>:<providerUserId>"`.
pub fn social_key(provider: &str, provider_user_id: &str) -> String {
    format!("{}:{}", provider, provider_user_id)
}

/// A provider account linked to exactly one local user.
///
/// The profile fields are a snapshot of what the provider reported the last
/// time this account signed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    /// Social key, e.g. "twitter:123456".
    pub id: String,

    /// Owning user. Set once, never changes.
    pub user_id: String,

    /// Handle at the provider, e.g. "andychilton".
    pub nick_name: String,

    /// Display name at the provider.
    pub title: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    pub inserted: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Social {
    /// New record for `identity`, owned by `user_id`.
    pub fn new(user_id: &str, identity: &SocialIdentity, now: DateTime<Utc>) -> Self {
        Self {
            id: identity.social_id(),
            user_id: user_id.to_string(),
            nick_name: identity.nickname.clone(),
            title: identity.display_name.clone(),
            email: identity.email.clone(),
            access_token: identity.access_token.clone(),
            access_token_secret: identity.access_token_secret.clone(),
            refresh_token: identity.refresh_token.clone(),
            inserted: now,
            updated: now,
        }
    }

    /// Overwrite the provider snapshot with what `identity` reports.
    /// Returns true if anything changed; `updated` is only bumped then.
    pub fn refresh(&mut self, identity: &SocialIdentity, now: DateTime<Utc>) -> bool {
        let unchanged = self.nick_name == identity.nickname
            && self.title == identity.display_name
            && self.email == identity.email
            && self.access_token == identity.access_token
            && self.access_token_secret == identity.access_token_secret
            && self.refresh_token == identity.refresh_token;
        if unchanged {
            return false;
        }

        self.nick_name = identity.nickname.clone();
        self.title = identity.display_name.clone();
        self.email = identity.email.clone();
        self.access_token = identity.access_token.clone();
        self.access_token_secret = identity.access_token_secret.clone();
        self.refresh_token = identity.refresh_token.clone();
        self.updated = now;
        true
    }
}

/// A verified provider account, as handed over by the OAuth layer after a
/// successful callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialIdentity {
    /// Provider name, e.g. "github". Must not contain ':'.
    pub provider: String,

    /// Account id assigned by the provider.
    pub provider_user_id: String,

    #[serde(default)]
    pub nickname: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_secret: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl SocialIdentity {
    pub fn new(
        provider: impl Into<String>,
        provider_user_id: impl Into<String>,
        nickname: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            provider_user_id: provider_user_id.into(),
            nickname: nickname.into(),
            display_name: display_name.into(),
            email: email.into(),
            ..Default::default()
        }
    }

    /// Attach OAuth credentials.
    pub fn with_tokens(
        mut self,
        access_token: Option<String>,
        access_token_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        self.access_token = access_token;
        self.access_token_secret = access_token_secret;
        self.refresh_token = refresh_token;
        self
    }

    pub fn social_id(&self) -> String {
        social_key(&self.provider, &self.provider_user_id)
    }
}
