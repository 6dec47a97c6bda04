//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use todo_core::ports::{GitHubOAuthService, TodoStore};
use todo_core::{AuthService, CredentialStore, TodoService, User};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub todos: TodoService,
    pub auth: AuthService,
}

impl AppState {
    /// Wires the services over the chosen todo store and a fresh credential store.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn TodoStore>,
        github: Arc<dyn GitHubOAuthService>,
    ) -> Self {
        let credentials = Arc::new(CredentialStore::new());
        Self {
            config,
            todos: TodoService::new(store),
            auth: AuthService::new(credentials, github),
        }
    }
}

//=========================================================================================
// Per-request State
//=========================================================================================

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}
