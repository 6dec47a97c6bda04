//! crates/todo_core/src/credentials.rs
//!
//! In-memory storage for users, login sessions and pending OAuth states.
//!
//! Each map has its own lock. Operations that need two maps take one lock,
//! release it and then take the other; nothing here is atomic across maps.
//! Nothing is persisted, so every session is lost on restart.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{AuthSession, OAuthState, User};

#[derive(Debug, Default)]
pub struct CredentialStore {
    /// Keyed by email, which makes the email unique.
    users: RwLock<HashMap<String, User>>,
    /// Keyed by session token.
    sessions: RwLock<HashMap<String, AuthSession>>,
    /// Keyed by the state value itself.
    oauth_states: RwLock<HashMap<String, OAuthState>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Users ---

    /// Stores `user` unless its email is taken. Returns `false` (and leaves the
    /// existing record untouched) when the email is already registered.
    pub async fn insert_user(&self, user: User) -> bool {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return false;
        }
        users.insert(user.email.clone(), user);
        true
    }

    /// Returns the user registered under `email`, creating it with `make` first
    /// if there is none. Lookup and insert happen under one write lock.
    pub async fn find_or_insert_user<F>(&self, email: &str, make: F) -> (User, bool)
    where
        F: FnOnce() -> User,
    {
        let mut users = self.users.write().await;
        if let Some(existing) = users.get(email) {
            return (existing.clone(), false);
        }
        let user = make();
        users.insert(email.to_string(), user.clone());
        (user, true)
    }

    pub async fn user_by_email(&self, email: &str) -> Option<User> {
        self.users.read().await.get(email).cloned()
    }

    /// Linear scan; users are keyed by email, not id.
    pub async fn user_by_id(&self, id: Uuid) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.id == id)
            .cloned()
    }

    // --- Sessions ---

    pub async fn insert_session(&self, session: AuthSession) {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session);
    }

    pub async fn session(&self, token: &str) -> Option<AuthSession> {
        self.sessions.read().await.get(token).cloned()
    }

    pub async fn remove_session(&self, token: &str) -> Option<AuthSession> {
        self.sessions.write().await.remove(token)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    // --- OAuth states ---

    pub async fn insert_state(&self, state: OAuthState) {
        self.oauth_states
            .write()
            .await
            .insert(state.state.clone(), state);
    }

    /// Removes and returns the entry for `state`, consuming it.
    pub async fn take_state(&self, state: &str) -> Option<OAuthState> {
        self.oauth_states.write().await.remove(state)
    }

    pub async fn state_count(&self) -> usize {
        self.oauth_states.read().await.len()
    }
}
