use thiserror::Error;

/// Failures reported by the auth operations.
///
/// `InvalidCredentials` deliberately does not say which field was wrong.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("Failed to create session")]
    SessionCreation,

    #[error("Name, email and password are required")]
    MissingFields,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}
