use argon2::Argon2;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

use super::{Result, SessionStore, StoreError};

/// ChaCha20-Poly1305 nonce length in bytes
const NONCE_LEN: usize = 12;

/// Key length in bytes
pub const KEY_LEN: usize = 32;

/// Encrypts values before handing them to the inner store.
///
/// Stored format is `base64(nonce || ciphertext)`. Anything that fails to
/// decode or authenticate is reported as `StoreError::Corrupt`.
pub struct EncryptedStore<S> {
    inner: S,
    cipher: ChaCha20Poly1305,
}

impl<S: SessionStore> EncryptedStore<S> {
    pub fn new(inner: S, key: &[u8; KEY_LEN]) -> Self {
        Self {
            inner,
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Derive the key from a passphrase with Argon2. The salt must be at
    /// least 8 bytes and stable across runs.
    pub fn from_passphrase(inner: S, passphrase: &str, salt: &[u8]) -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), salt, &mut key)
            .map_err(|e| StoreError::Crypto(e.to_string()))?;
        Ok(Self::new(inner, &key))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| StoreError::Crypto(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    fn open(&self, encoded: &str) -> Result<String> {
        let sealed = STANDARD
            .decode(encoded.trim())
            .map_err(|e| StoreError::Corrupt(format!("not base64: {}", e)))?;
        if sealed.len() < NONCE_LEN {
            return Err(StoreError::Corrupt("value shorter than nonce".to_string()));
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StoreError::Corrupt("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| StoreError::Corrupt("plaintext is not UTF-8".to_string()))
    }
}

impl<S: SessionStore> SessionStore for EncryptedStore<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.inner.get(key)? {
            Some(encoded) => self.open(&encoded).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let sealed = self.seal(value)?;
        self.inner.set(key, &sealed)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }
}
