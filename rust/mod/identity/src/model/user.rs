use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A local user. Owns one or more linked social accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes). Never changes.
    pub id: String,

    /// Unique handle, e.g. "andy-123". Kept in the username index.
    pub name: String,

    /// Display name.
    pub title: String,

    pub email: String,

    /// Linked social keys ("<provider>:<providerUserId>"), in link order.
    #[serde(default)]
    pub social_ids: Vec<String>,

    pub inserted: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Profile fields a signed-in user may change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: String,
    pub title: String,
    pub email: String,
}

impl UpdateUser {
    pub fn new(name: impl Into<String>, title: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            email: email.into(),
        }
    }

    /// Copy with surrounding whitespace stripped from every field.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            title: self.title.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}
