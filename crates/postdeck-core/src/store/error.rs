use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session storage is unavailable")]
    Unavailable,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("Session expiry is out of range")]
    ExpiryOverflow,

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// Whether the stored value exists but cannot be understood.
    /// Callers treat these as garbage to be removed.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt(_))
    }
}
