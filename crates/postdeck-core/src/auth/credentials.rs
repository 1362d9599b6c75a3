use std::sync::OnceLock;

use tracing::debug;

use super::password::{hash_password, verify_password};
use super::AuthError;
use crate::models::User;

/// Hash checked when no email matches, so unknown accounts cost as much
/// as wrong passwords.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("postdeck-unknown-account").ok())
        .as_deref()
}

/// A known account: the public user plus its password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    user: User,
    password_hash: String,
}

impl UserRecord {
    /// Build a record from a plaintext password, hashing it immediately.
    pub fn new(
        id: &str,
        name: &str,
        email: &str,
        password: &str,
        image: Option<&str>,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            user: User::new(id, name, email, image.map(str::to_string)),
            password_hash: hash_password(password)?,
        })
    }

    /// Build a record from an existing PHC hash string.
    pub fn with_hash(user: User, password_hash: impl Into<String>) -> Self {
        Self {
            user,
            password_hash: password_hash.into(),
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

/// Fixed, read-only set of accounts that sign-in is checked against.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: Vec<UserRecord>,
}

impl CredentialStore {
    pub fn new(records: Vec<UserRecord>) -> Self {
        Self { records }
    }

    /// The built-in accounts, including the well-known demo login
    /// `demo@example.com` / `demo123`.
    pub fn with_demo_users() -> Result<Self, AuthError> {
        let records = vec![
            UserRecord::new(
                "1",
                "Demo User",
                "demo@example.com",
                "demo123",
                Some("/placeholder.svg?height=32&width=32"),
            )?,
            UserRecord::new("2", "John Doe", "John@Example.com", "password123", None)?,
        ];
        debug!(count = records.len(), "Loaded demo credential store");
        Ok(Self::new(records))
    }

    /// Find the record whose email matches (ignoring case) and whose
    /// password verifies. A hash check runs even for unknown emails.
    pub fn find_user(&self, email: &str, password: &str) -> Option<&UserRecord> {
        match self.find_by_email(email) {
            Some(record) => record.verify(password).then_some(record),
            None => {
                if let Some(hash) = dummy_hash() {
                    verify_password(password, hash);
                }
                None
            }
        }
    }

    pub fn find_by_email(&self, email: &str) -> Option<&UserRecord> {
        self.records.iter().find(|record| record.user.has_email(email))
    }

    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.records.iter().map(UserRecord::user)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
