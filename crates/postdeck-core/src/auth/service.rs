//! Sign-in, sign-up and sign-out over a credential store and a session
//! manager.
//!
//! The service has two states, derived from the stored session rather
//! than tracked separately:
//!
//! ```text
//! Anonymous --sign_in(valid)--> Authenticated
//! Authenticated --sign_out | session expiry--> Anonymous
//! ```

use rand::Rng;
use tracing::{debug, info, warn};

use super::{AuthError, CredentialStore, Session, SessionManager};
use crate::models::User;
use crate::store::SessionStore;

/// Characters used for synthesized user ids
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of synthesized user ids
const ID_LENGTH: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated(Session),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

pub struct AuthService<S> {
    credentials: CredentialStore,
    sessions: SessionManager<S>,
}

impl<S: SessionStore> AuthService<S> {
    pub fn new(credentials: CredentialStore, sessions: SessionManager<S>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    /// Check credentials and start a session.
    ///
    /// Unknown email and wrong password fail identically.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = match self.credentials.find_user(email, password) {
            Some(record) => record.user().clone(),
            None => {
                debug!("Sign-in rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        match self.sessions.create(user.clone()) {
            Ok(_) => {
                info!(user_id = %user.id, "Signed in");
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Could not persist session");
                Err(AuthError::SessionCreation)
            }
        }
    }

    /// Validate a new account and hand back a fresh user id.
    ///
    /// The credential store is read-only: the new account is not saved and
    /// cannot sign in afterwards. Persisting accounts belongs to a real
    /// user database.
    pub fn sign_up(&self, name: &str, email: &str, password: &str) -> Result<String, AuthError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        if self.credentials.find_by_email(email).is_some() {
            debug!("Sign-up rejected: email already registered");
            return Err(AuthError::UserExists);
        }

        let user_id = generate_user_id();
        info!(user_id = %user_id, "Signed up");
        Ok(user_id)
    }

    /// End the session. Storage failures are logged, never returned.
    pub fn sign_out(&self) {
        match self.sessions.clear() {
            Ok(()) => info!("Signed out"),
            Err(e) => warn!(error = %e, "Failed to clear session during sign-out"),
        }
    }

    pub fn get_session(&self) -> Option<Session> {
        self.sessions.read()
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_session().is_some()
    }

    pub fn state(&self) -> AuthState {
        match self.get_session() {
            Some(session) => AuthState::Authenticated(session),
            None => AuthState::Anonymous,
        }
    }
}

fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
