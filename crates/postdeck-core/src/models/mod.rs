//! Data models shared between the auth core and its front ends.
//!
//! - `User`: sanitized identity (no password)
//! - `SignInResponse`, `SignUpResponse`: result envelopes for the UI

pub mod response;
pub mod user;

pub use response::{SignInResponse, SignUpResponse};
pub use user::User;
