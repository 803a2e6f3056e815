//! Session persistence.
//!
//! A session is a bearer token plus the profile fetched with it. Both are
//! stored together and loaded together; a token without a readable profile
//! is discarded on load.

mod storage;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use crate::api::{UserProfile, mask_token};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-serialized profile.
pub const USER_KEY: &str = "user";

/// In-memory view of the persisted session.
///
/// Either both fields are present or neither is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Reads and writes the session through a [`SessionStorage`] backend.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
}

impl SessionStore<FileStorage> {
    /// Store backed by `$TRAFEGO_HOME/session.json`.
    pub fn open_default() -> Self {
        Self::new(FileStorage::default_location())
    }
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Persists token and profile together.
    ///
    /// # Errors
    /// Returns an error if the profile cannot be serialized or the storage
    /// write fails; in that case nothing new is stored.
    pub fn save(&mut self, token: &str, profile: &UserProfile) -> Result<Session> {
        let user = serde_json::to_string(profile).context("Failed to serialize user profile")?;
        self.storage
            .set_all(&[(TOKEN_KEY, token), (USER_KEY, &user)])
            .context("Failed to persist session")?;

        info!(token = %mask_token(token), user = %profile.name, "session saved");
        Ok(Session::new(token, profile.clone()))
    }

    /// Loads the stored session.
    ///
    /// Absent, unreadable or partial data yields an empty session; partial
    /// data is also cleared so it cannot resurface.
    pub fn load(&mut self) -> Session {
        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("Ignoring unreadable session: {e:#}");
                self.discard_partial();
                return Session::empty();
            }
        };
        let user = self.storage.get(USER_KEY).ok().flatten();

        match (token, user) {
            (None, None) => Session::empty(),
            (Some(token), Some(user)) if !token.trim().is_empty() => {
                match serde_json::from_str::<UserProfile>(&user) {
                    Ok(profile) => Session::new(token, profile),
                    Err(e) => {
                        warn!("Ignoring session with corrupt profile: {e}");
                        self.discard_partial();
                        Session::empty()
                    }
                }
            }
            _ => {
                warn!("Ignoring incomplete session");
                self.discard_partial();
                Session::empty()
            }
        }
    }

    /// Removes token and profile. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the storage write fails.
    pub fn clear(&mut self) -> Result<()> {
        self.storage
            .remove_all(&[TOKEN_KEY, USER_KEY])
            .context("Failed to clear session")?;
        info!("session cleared");
        Ok(())
    }

    fn discard_partial(&mut self) {
        if let Err(e) = self.storage.remove_all(&[TOKEN_KEY, USER_KEY]) {
            warn!("Failed to discard incomplete session: {e:#}");
        }
    }
}
