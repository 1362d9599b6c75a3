//! Core library for postdeck.
//!
//! Postdeck's dashboard runs on mocked data; the one stateful piece is its
//! login. This crate holds that piece:
//!
//! - `auth`: credential store, session manager and the auth operations
//! - `store`: pluggable storage for the persisted session
//! - `models`: the sanitized `User` and the UI response envelopes
//! - `config`: backend selection and on-disk configuration

pub mod auth;
pub mod config;
pub mod models;
pub mod store;

pub use auth::{AuthError, AuthService, AuthState, CredentialStore, Session, SessionManager};
pub use config::{Config, SessionBackend};
pub use models::{SignInResponse, SignUpResponse, User};
pub use store::{SessionStore, StoreError};
