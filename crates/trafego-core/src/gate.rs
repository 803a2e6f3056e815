//! Login/dashboard routing driven by the session.

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::session::{Session, SessionStorage, SessionStore};

/// Which top-level view the user should see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

/// Decides the route from session contents alone.
pub fn route(session: &Session) -> Route {
    if session.is_authenticated() {
        Route::Dashboard
    } else {
        Route::Login
    }
}

/// Owns the session store and the in-memory session.
///
/// Every transition (login, logout, authentication failure) goes through
/// here so the persisted and in-memory copies never diverge.
#[derive(Debug)]
pub struct SessionGate<S> {
    store: SessionStore<S>,
    session: Session,
}

impl<S: SessionStorage> SessionGate<S> {
    /// Loads the persisted session once.
    pub fn new(mut store: SessionStore<S>) -> Self {
        let session = store.load();
        Self { store, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn route(&self) -> Route {
        route(&self.session)
    }

    /// A client carrying the current token (or none when logged out).
    pub fn client(&self, base: &ApiClient) -> ApiClient {
        base.with_token(self.session.token())
    }

    /// Logs in and persists the new session.
    ///
    /// Any previous session is cleared first. On failure the session stays
    /// empty.
    ///
    /// # Errors
    /// Returns the [`ApiError`] from the login calls, or a storage error.
    pub async fn login(&mut self, base: &ApiClient, username: &str, password: &str) -> Result<()> {
        self.clear()?;

        let outcome = base.with_token(None).login(username, password).await?;
        self.session = self.store.save(&outcome.token, &outcome.profile)?;
        Ok(())
    }

    /// Explicit logout. Idempotent.
    ///
    /// # Errors
    /// Returns an error if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.clear()?;
        info!("logged out");
        Ok(())
    }

    /// Reacts to an API failure from any call.
    ///
    /// Authentication failures end the session. Returns whether the session
    /// was cleared.
    ///
    /// # Errors
    /// Returns an error if the stored session cannot be removed.
    pub fn observe(&mut self, error: &ApiError) -> Result<bool> {
        if !error.is_authentication() {
            return Ok(false);
        }

        warn!("session ended by server: {error}");
        self.clear()?;
        Ok(true)
    }

    /// Memory follows storage: a failed store clear leaves the session as is.
    fn clear(&mut self) -> Result<()> {
        self.store.clear()?;
        self.session = Session::empty();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UserProfile;
    use crate::session::{FileStorage, MemoryStorage};

    fn profile() -> UserProfile {
        UserProfile {
            name: "Ana".to_string(),
            role: "admin".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_route_empty_is_login() {
        assert_eq!(route(&Session::empty()), Route::Login);
    }

    #[test]
    fn test_route_with_token_and_profile_is_dashboard() {
        assert_eq!(route(&Session::new("t", profile())), Route::Dashboard);
    }

    #[test]
    fn test_gate_restores_persisted_session() {
        let mut store = SessionStore::new(MemoryStorage::new());
        store.save("t", &profile()).unwrap();

        let gate = SessionGate::new(store);
        assert_eq!(gate.route(), Route::Dashboard);
        assert_eq!(gate.session().token(), Some("t"));
    }

    #[test]
    fn test_observe_authentication_clears_session() {
        let mut store = SessionStore::new(MemoryStorage::new());
        store.save("t", &profile()).unwrap();
        let mut gate = SessionGate::new(store);

        assert!(!gate.observe(&ApiError::status(500, "boom")).unwrap());
        assert!(!gate.observe(&ApiError::transport("down")).unwrap());
        assert_eq!(gate.route(), Route::Dashboard);

        assert!(gate.observe(&ApiError::authentication(401, "expired")).unwrap());
        assert_eq!(gate.route(), Route::Login);
        assert_eq!(gate.session(), &Session::empty());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut store = SessionStore::new(MemoryStorage::new());
        store.save("t", &profile()).unwrap();
        let mut gate = SessionGate::new(store);

        gate.logout().unwrap();
        gate.logout().unwrap();
        assert_eq!(gate.route(), Route::Login);
    }

    #[test]
    fn test_failed_logout_keeps_session_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = SessionStore::new(FileStorage::new(&path));
        store.save("t", &profile()).unwrap();
        let mut gate = SessionGate::new(store);

        // a directory in place of the session file cannot be removed as a file
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(gate.logout().is_err());
        assert_eq!(gate.route(), Route::Dashboard);
        assert_eq!(gate.session().token(), Some("t"));
    }

    #[test]
    fn test_client_carries_current_token() {
        let base = ApiClient::new("http://localhost:8000", None).unwrap();
        let mut store = SessionStore::new(MemoryStorage::new());
        store.save("abc", &profile()).unwrap();
        let mut gate = SessionGate::new(store);

        assert_eq!(gate.client(&base).token(), Some("abc"));
        gate.logout().unwrap();
        assert_eq!(gate.client(&base).token(), None);
    }
}
