use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::User;
use crate::store::{SessionStore, StoreError};

/// Storage key the session lives under
pub const SESSION_KEY: &str = "user_session";

/// Session lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Session {
    pub user: User,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub expires: DateTime<Utc>,
}

impl Session {
    /// Valid strictly before `expires`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires - now
    }

    /// Whole days remaining (for display)
    pub fn days_until_expiry_at(&self, now: DateTime<Utc>) -> i64 {
        self.time_until_expiry_at(now).num_days().max(0)
    }
}

/// Reads, writes and expires the persisted session.
pub struct SessionManager<S> {
    store: S,
    ttl: Duration,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ttl: Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the current session, if any
    pub fn read(&self) -> Option<Session> {
        self.read_at(Utc::now())
    }

    /// Load the session as of `now`.
    ///
    /// Unparseable or expired records are deleted and reported as absent.
    /// Storage failures are logged and also reported as absent.
    pub fn read_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) if e.is_corrupt() => {
                self.discard("unreadable", &e.to_string());
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Session storage read failed");
                return None;
            }
        };

        let session: Session = match serde_json::from_str(&raw) {
            Ok(session) => session,
            Err(e) => {
                self.discard("unparseable", &e.to_string());
                return None;
            }
        };

        if session.is_expired_at(now) {
            self.discard("expired", &session.expires.to_rfc3339());
            return None;
        }

        Some(session)
    }

    /// Persist a new session for `user` expiring one TTL from now
    pub fn create(&self, user: User) -> Result<Session, StoreError> {
        self.create_at(user, Utc::now())
    }

    pub fn create_at(&self, user: User, now: DateTime<Utc>) -> Result<Session, StoreError> {
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or(StoreError::ExpiryOverflow)?;
        let session = Session { user, expires };
        let contents = serde_json::to_string(&session)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.set(SESSION_KEY, &contents)?;
        debug!(user_id = %session.user.id, expires = %session.expires, "Session created");
        Ok(session)
    }

    /// Remove the stored session. Safe to call when none exists.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(SESSION_KEY)?;
        debug!("Session cleared");
        Ok(())
    }

    fn discard(&self, reason: &str, detail: &str) {
        debug!(reason, detail, "Discarding stored session");
        if let Err(e) = self.store.delete(SESSION_KEY) {
            warn!(error = %e, "Failed to delete stored session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EncryptedStore, FileStore, MemoryStore, UnavailableStore};

    fn demo_user() -> User {
        User::new(
            "1",
            "Demo User",
            "demo@example.com",
            Some("/placeholder.svg?height=32&width=32".to_string()),
        )
    }

    #[test]
    fn test_read_empty_store() {
        let manager = SessionManager::new(MemoryStore::new());
        assert!(manager.read().is_none());
    }

    #[test]
    fn test_create_then_read() {
        let manager = SessionManager::new(MemoryStore::new());
        let created = manager.create(demo_user()).unwrap();
        let read = manager.read().unwrap();
        assert_eq!(created, read);
        assert_eq!(read.user.name, "Demo User");
    }

    #[test]
    fn test_create_sets_seven_day_expiry() {
        let manager = SessionManager::new(MemoryStore::new());
        let now = Utc::now();
        let session = manager.create_at(demo_user(), now).unwrap();
        assert_eq!(session.expires, now + Duration::days(7));
        assert_eq!(session.days_until_expiry_at(now), 7);
    }

    #[test]
    fn test_valid_at_six_days_absent_at_eight() {
        let manager = SessionManager::new(MemoryStore::new());
        let now = Utc::now();
        manager.create_at(demo_user(), now).unwrap();

        assert!(manager.read_at(now + Duration::days(6)).is_some());

        assert!(manager.read_at(now + Duration::days(8)).is_none());
        assert!(manager.store().get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let manager = SessionManager::new(MemoryStore::new());
        let now = Utc::now();
        let session = manager.create_at(demo_user(), now).unwrap();

        assert!(manager.read_at(session.expires - Duration::seconds(1)).is_some());
        assert!(manager.read_at(session.expires).is_none());
    }

    #[test]
    fn test_malformed_json_is_removed() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.store().set(SESSION_KEY, "{not json").unwrap();

        assert!(manager.read().is_none());
        assert!(manager.store().get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_wrong_shape_is_removed() {
        let manager = SessionManager::new(MemoryStore::new());
        manager
            .store()
            .set(SESSION_KEY, r#"{"user":{"id":"1"},"expires":"tomorrow"}"#)
            .unwrap();

        assert!(manager.read().is_none());
        assert!(manager.store().get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_stored_layout() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.create(demo_user()).unwrap();

        let raw = manager.store().get(SESSION_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["user"]["email"], "demo@example.com");
        assert_eq!(json["user"]["image"], "/placeholder.svg?height=32&width=32");
        assert!(json["user"].get("password").is_none());

        let expires = json["expires"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(expires).is_ok());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let manager = SessionManager::new(MemoryStore::new());
        manager.create(demo_user()).unwrap();
        manager.clear().unwrap();
        manager.clear().unwrap();
        assert!(manager.read().is_none());
    }

    #[test]
    fn test_custom_ttl() {
        let manager = SessionManager::new(MemoryStore::new()).with_ttl(Duration::hours(1));
        let now = Utc::now();
        manager.create_at(demo_user(), now).unwrap();
        assert!(manager.read_at(now + Duration::minutes(59)).is_some());
        assert!(manager.read_at(now + Duration::minutes(61)).is_none());
    }

    #[test]
    fn test_non_utf8_session_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_session.json");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let manager = SessionManager::new(FileStore::new(dir.path()));
        assert!(manager.read().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let manager =
            SessionManager::new(MemoryStore::new()).with_ttl(Duration::days(100_000_000));
        let err = manager.create(demo_user()).unwrap_err();
        assert!(matches!(err, StoreError::ExpiryOverflow));
        assert!(manager.store().get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn test_unavailable_store_reads_as_absent() {
        let manager = SessionManager::new(UnavailableStore);
        assert!(manager.read().is_none());
        assert!(manager.create(demo_user()).is_err());
        assert!(manager.clear().is_err());
    }

    #[test]
    fn test_tampered_encrypted_session_is_removed() {
        let inner = MemoryStore::new();
        let manager = SessionManager::new(EncryptedStore::new(&inner, &[3u8; 32]));
        manager.create(demo_user()).unwrap();
        assert!(manager.read().is_some());

        inner.set(SESSION_KEY, "AAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
        assert!(manager.read().is_none());
        assert!(inner.get(SESSION_KEY).unwrap().is_none());
    }
}
