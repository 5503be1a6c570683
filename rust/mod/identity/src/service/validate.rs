//! Field rules for profile updates and inbound identities.
//!
//! Checks run before any transaction is opened and report every failing
//! field at once rather than stopping at the first one.

use std::fmt;

use crate::model::{SocialIdentity, UpdateUser};

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 32;

/// A single failing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All failing fields of one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// First message reported for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a (normalized) profile patch against the user's current name.
///
/// Name rules only apply to a new name: generated names may predate them
/// and must not block edits of the other fields.
pub fn validate_update(patch: &UpdateUser, current_name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if patch.name != current_name {
        if let Err(msg) = check_username(&patch.name) {
            errors.push("name", msg);
        }
    }
    if patch.title.is_empty() {
        errors.push("title", "title is required");
    }
    if patch.email.is_empty() {
        errors.push("email", "email is required");
    } else if !is_valid_email(&patch.email) {
        errors.push("email", "email is not a valid address");
    }

    errors.into_result()
}

/// Validate a username on its own.
pub fn validate_username(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if let Err(msg) = check_username(name) {
        errors.push("name", msg);
    }
    errors.into_result()
}

/// Validate the key fields of an inbound identity.
pub fn validate_identity(identity: &SocialIdentity) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if identity.provider.is_empty() {
        errors.push("provider", "provider is required");
    } else if identity.provider.contains(':') {
        errors.push("provider", "provider must not contain ':'");
    }
    if identity.provider_user_id.is_empty() {
        errors.push("provider_user_id", "provider user id is required");
    }

    errors.into_result()
}

/// Usernames: 3-32 chars, lowercase letters, digits and '-', starting with a
/// letter and not ending with '-'.
fn check_username(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is required".into());
    }
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(format!(
            "name must be between {} and {} characters",
            NAME_MIN_LEN, NAME_MAX_LEN
        ));
    }

    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_lowercase() {
        return Err("name must start with a lowercase letter".into());
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("name may only contain lowercase letters, digits and '-'".into());
    }
    if bytes[bytes.len() - 1] == b'-' {
        return Err("name must not end with '-'".into());
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}
