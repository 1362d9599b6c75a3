//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which picks
//! the session storage backend, the session lifetime and where data and
//! logs go.
//!
//! Configuration is stored at `~/.config/postdeck/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Duration;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::{AuthService, CredentialStore, SessionManager, SESSION_TTL_DAYS};
use crate::store::{EncryptedStore, FileStore, KeyringStore, MemoryStore, SessionStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "postdeck";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Longest session lifetime the config may ask for
const MAX_SESSION_TTL_DAYS: i64 = 365;

/// Random salt length for passphrase key derivation
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// JSON file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Process memory only. Nothing survives between processes, so this
    /// is for embedding the core in a long-running host, not for the CLI.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session_backend: SessionBackend,
    #[serde(default = "default_ttl_days")]
    pub session_ttl_days: i64,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Base64 salt for deriving the session encryption key
    #[serde(default)]
    pub encryption_salt: Option<String>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_ttl_days() -> i64 {
    SESSION_TTL_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_backend: SessionBackend::default(),
            session_ttl_days: SESSION_TTL_DAYS,
            data_dir: None,
            encryption_salt: None,
            log_file: None,
        }
    }
}

impl SessionBackend {
    /// Whether sessions outlive the process that created them
    pub fn is_persistent(&self) -> bool {
        !matches!(self, SessionBackend::Memory)
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Load from an explicit path; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Session lifetime. Non-positive values fall back to the default and
    /// large ones are capped at `MAX_SESSION_TTL_DAYS`.
    pub fn session_ttl(&self) -> Duration {
        let days = if self.session_ttl_days <= 0 {
            warn!(
                configured = self.session_ttl_days,
                "Ignoring non-positive session_ttl_days"
            );
            SESSION_TTL_DAYS
        } else if self.session_ttl_days > MAX_SESSION_TTL_DAYS {
            warn!(
                configured = self.session_ttl_days,
                max = MAX_SESSION_TTL_DAYS,
                "Capping session_ttl_days"
            );
            MAX_SESSION_TTL_DAYS
        } else {
            self.session_ttl_days
        };
        Duration::try_days(days).unwrap_or_else(|| Duration::days(SESSION_TTL_DAYS))
    }

    /// Generate an encryption salt if none is set or the stored one is
    /// unusable. Returns true when the config changed and should be saved.
    pub fn ensure_encryption_salt(&mut self) -> bool {
        if self.salt_bytes().is_some() {
            return false;
        }
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        self.encryption_salt = Some(STANDARD.encode(salt));
        true
    }

    fn salt_bytes(&self) -> Option<Vec<u8>> {
        self.encryption_salt
            .as_deref()
            .and_then(|s| STANDARD.decode(s).ok())
            .filter(|salt| salt.len() >= SALT_LEN)
    }

    /// Open the configured session store, encrypted when a passphrase is
    /// given.
    pub fn session_store(&self, passphrase: Option<&str>) -> Result<Box<dyn SessionStore>> {
        let store: Box<dyn SessionStore> = match self.session_backend {
            SessionBackend::File => Box::new(FileStore::new(self.data_dir()?)),
            SessionBackend::Keyring => Box::new(KeyringStore::new(APP_NAME)),
            SessionBackend::Memory => Box::new(MemoryStore::new()),
        };

        match passphrase {
            Some(passphrase) => {
                let salt = self
                    .salt_bytes()
                    .context("Encryption salt missing; call ensure_encryption_salt first")?;
                let encrypted = EncryptedStore::from_passphrase(store, passphrase, &salt)
                    .context("Failed to derive session encryption key")?;
                Ok(Box::new(encrypted))
            }
            None => Ok(store),
        }
    }

    /// Build the auth service the front end talks to
    pub fn auth_service(
        &self,
        passphrase: Option<&str>,
    ) -> Result<AuthService<Box<dyn SessionStore>>> {
        let credentials =
            CredentialStore::with_demo_users().context("Failed to build credential store")?;
        let sessions =
            SessionManager::new(self.session_store(passphrase)?).with_ttl(self.session_ttl());
        Ok(AuthService::new(credentials, sessions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.session_backend, SessionBackend::File);
        assert_eq!(config.session_ttl_days, 7);
        assert!(config.encryption_salt.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"session_backend":"memory"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session_backend, SessionBackend::Memory);
        assert_eq!(config.session_ttl_days, 7);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.session_backend = SessionBackend::Keyring;
        config.session_ttl_days = 3;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.session_backend, SessionBackend::Keyring);
        assert_eq!(loaded.session_ttl_days, 3);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_backend_persistence() {
        assert!(SessionBackend::File.is_persistent());
        assert!(SessionBackend::Keyring.is_persistent());
        assert!(!SessionBackend::Memory.is_persistent());
    }

    #[test]
    fn test_session_ttl_falls_back() {
        let mut config = Config::default();
        assert_eq!(config.session_ttl(), Duration::days(7));
        config.session_ttl_days = 0;
        assert_eq!(config.session_ttl(), Duration::days(7));
        config.session_ttl_days = 2;
        assert_eq!(config.session_ttl(), Duration::days(2));
    }

    #[test]
    fn test_huge_session_ttl_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = Some(dir.path().to_path_buf());
        config.session_ttl_days = 1_000_000_000;
        assert_eq!(config.session_ttl(), Duration::days(365));

        config.session_ttl_days = i64::MAX;
        assert_eq!(config.session_ttl(), Duration::days(365));

        let auth = config.auth_service(None).unwrap();
        auth.sign_in("demo@example.com", "demo123").unwrap();
        assert_eq!(auth.get_session().unwrap().days_until_expiry_at(chrono::Utc::now()), 364);
    }

    #[test]
    fn test_ensure_encryption_salt() {
        let mut config = Config::default();
        assert!(config.ensure_encryption_salt());
        let salt = config.encryption_salt.clone();
        assert!(!config.ensure_encryption_salt());
        assert_eq!(config.encryption_salt, salt);

        config.encryption_salt = Some("!!".to_string());
        assert!(config.ensure_encryption_salt());
    }

    #[test]
    fn test_encrypted_store_requires_salt() {
        let mut config = Config::default();
        config.session_backend = SessionBackend::Memory;
        assert!(config.session_store(Some("pw")).is_err());

        config.ensure_encryption_salt();
        assert!(config.session_store(Some("pw")).is_ok());
    }

    #[test]
    fn test_auth_service_with_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = Some(dir.path().to_path_buf());

        let auth = config.auth_service(None).unwrap();
        auth.sign_in("demo@example.com", "demo123").unwrap();
        assert!(dir.path().join("user_session.json").exists());

        // A second service over the same directory sees the session
        let again = config.auth_service(None).unwrap();
        assert!(again.is_authenticated());
        again.sign_out();
        assert!(!dir.path().join("user_session.json").exists());
    }
}
