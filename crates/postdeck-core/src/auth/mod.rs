//! Authentication module for the dashboard's mock login.
//!
//! This module provides:
//! - `CredentialStore`: fixed accounts with Argon2 password hashes
//! - `SessionManager`: persisted session with a 7-day expiry
//! - `AuthService`: sign-in, sign-up, sign-out and the authenticated check
//!
//! Sessions live in a `SessionStore` under the `user_session` key and are
//! dropped lazily on the first read after they expire.

pub mod credentials;
pub mod error;
pub mod password;
pub mod service;
pub mod session;

pub use credentials::{CredentialStore, UserRecord};
pub use error::AuthError;
pub use service::{AuthService, AuthState};
pub use session::{Session, SessionManager, SESSION_KEY, SESSION_TTL_DAYS};
