//! Logged-in user and the team roster.
//!
//! The bearer token lives in a [`TokenStore`]; this module only decides when
//! to write or clear it. The user and roster are held in memory and reset
//! on logout.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::api::{AuthResponse, RemoteApi};
use super::models::User;
use super::token::TokenStore;
use crate::errors::BoardError;

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    roster: Vec<User>,
}

pub struct SessionStore {
    api: Arc<dyn RemoteApi>,
    tokens: Arc<dyn TokenStore>,
    state: Mutex<SessionState>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn RemoteApi>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            tokens,
            state: Mutex::new(SessionState::default()),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> Result<R, BoardError> {
        let mut guard = self.state.lock().map_err(|_| BoardError::LockPoisoned)?;
        Ok(f(&mut guard))
    }

    fn adopt(&self, auth: AuthResponse) -> Result<User, BoardError> {
        self.tokens.save(&auth.token)?;
        let user = auth.user;
        let stored = user.clone();
        self.with_state(move |s| s.user = Some(stored))?;
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, BoardError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(BoardError::blank("email"));
        }
        if password.is_empty() {
            return Err(BoardError::blank("password"));
        }
        let auth = match self.api.login(email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!(email, error = %e, "login failed");
                return Err(e.into());
            }
        };
        let user = self.adopt(auth)?;
        tracing::info!(user_id = %user.id, "logged in");
        Ok(user)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User, BoardError> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() {
            return Err(BoardError::blank("name"));
        }
        if email.is_empty() {
            return Err(BoardError::blank("email"));
        }
        if password.is_empty() {
            return Err(BoardError::blank("password"));
        }
        let auth = match self.api.signup(name, email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!(email, error = %e, "signup failed");
                return Err(e.into());
            }
        };
        let user = self.adopt(auth)?;
        tracing::info!(user_id = %user.id, "signed up");
        Ok(user)
    }

    /// Re-establish the session from a persisted token. `Ok(None)` when no
    /// token is stored or the server no longer accepts it; a rejected token
    /// is cleared.
    pub async fn restore(&self) -> Result<Option<User>, BoardError> {
        if self.tokens.load()?.is_none() {
            tracing::debug!("no persisted session token");
            return Ok(None);
        }
        match self.api.fetch_current_user().await {
            Ok(user) => {
                let stored = user.clone();
                self.with_state(move |s| s.user = Some(stored))?;
                tracing::info!(user_id = %user.id, "restored session");
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("persisted session token rejected; clearing it");
                self.tokens.clear()?;
                self.with_state(|s| *s = SessionState::default())?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to restore session");
                Err(e.into())
            }
        }
    }

    pub fn logout(&self) -> Result<(), BoardError> {
        self.tokens.clear()?;
        self.with_state(|s| *s = SessionState::default())?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Replace the roster with the server's user list. Later duplicates of
    /// an id are dropped.
    pub async fn refresh_roster(&self) -> Result<usize, BoardError> {
        let users = match self.api.fetch_users().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch users");
                return Err(e.into());
            }
        };
        let mut seen = HashSet::new();
        let roster: Vec<User> = users
            .into_iter()
            .filter(|u| {
                let fresh = seen.insert(u.id.clone());
                if !fresh {
                    tracing::warn!(user_id = %u.id, "duplicate user in roster; dropping");
                }
                fresh
            })
            .collect();
        let count = roster.len();
        self.with_state(move |s| s.roster = roster)?;
        tracing::info!(count, "refreshed roster");
        Ok(count)
    }

    pub async fn fetch_user(&self, id: &str) -> Result<User, BoardError> {
        self.api.fetch_user(id).await.map_err(|e| {
            tracing::warn!(user_id = id, error = %e, "failed to fetch user");
            e.into()
        })
    }

    pub fn current_user(&self) -> Result<Option<User>, BoardError> {
        self.with_state(|s| s.user.clone())
    }

    pub fn is_authenticated(&self) -> Result<bool, BoardError> {
        self.with_state(|s| s.user.is_some())
    }

    pub fn roster(&self) -> Result<Vec<User>, BoardError> {
        self.with_state(|s| s.roster.clone())
    }

    pub fn find_user(&self, id: &str) -> Result<Option<User>, BoardError> {
        self.with_state(|s| s.roster.iter().find(|u| u.id == id).cloned())
    }

    /// Team directory: roster members that are not suspended.
    pub fn active_roster(&self) -> Result<Vec<User>, BoardError> {
        self.with_state(|s| s.roster.iter().filter(|u| !u.suspended).cloned().collect())
    }
}
