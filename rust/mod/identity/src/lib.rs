//! Identity module: social logins reconciled against local users.
//!
//! # Records
//!
//! - **User** — local account with a unique username
//! - **Social** — provider account (`"<provider>:<id>"`) owned by one user
//! - **Username index** — `username -> userId`, kept in step with `User.name`
//!
//! # Usage
//!
//! ```ignore
//! use identity::{IdentityStore, SocialIdentity};
//!
//! let store = IdentityStore::open(&path)?;
//! let identity = SocialIdentity::new("github", "42", "octo", "Octo Cat", "o@example.com");
//! let user = store.login(None, &identity)?;
//! ```

pub mod model;
pub mod service;

pub use model::{SessionPayload, Social, SocialIdentity, UpdateUser, User};
pub use service::validate::{FieldError, ValidationErrors};
pub use service::{error_code, IdentityError, IdentityStore};
