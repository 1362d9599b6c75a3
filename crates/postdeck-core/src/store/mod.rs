//! Key-value storage backends for the persisted session.
//!
//! The session manager only talks to the `SessionStore` trait, so the
//! backing storage can be swapped without touching auth logic:
//!
//! - `MemoryStore`: in-process map, the browser `localStorage` stand-in
//! - `UnavailableStore`: no storage at all (every call fails)
//! - `FileStore`: one JSON file per key in a data directory
//! - `KeyringStore`: one OS keychain entry per key
//! - `EncryptedStore`: ChaCha20-Poly1305 layer over any other store

pub mod encrypted;
pub mod error;
pub mod file;
pub mod keychain;
pub mod memory;

pub use encrypted::EncryptedStore;
pub use error::StoreError;
pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::{MemoryStore, UnavailableStore};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Minimal get/set/delete surface over string values.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// Keys double as file names and keychain accounts, so keep them plain.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("user_session").is_ok());
        assert!(validate_key("session-2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("has space").is_err());
    }

    #[test]
    fn test_boxed_store_delegates() {
        let store: Box<dyn SessionStore> = Box::new(MemoryStore::new());
        store.set("user_session", "{}").unwrap();
        assert_eq!(store.get("user_session").unwrap().as_deref(), Some("{}"));
        store.delete("user_session").unwrap();
        assert!(store.get("user_session").unwrap().is_none());
    }
}
