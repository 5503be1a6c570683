pub mod session;
pub mod social;
pub mod user;

pub use session::SessionPayload;
pub use social::{social_key, Social, SocialIdentity};
pub use user::{UpdateUser, User};
