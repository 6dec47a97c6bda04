//! crates/todo_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{GitHubEmail, GitHubUser, Todo};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent storage for todos. Implementations are chosen once at startup.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, todo: &Todo) -> PortResult<()>;

    async fn get(&self, id: Uuid) -> PortResult<Todo>;

    /// All todos owned by `user_id`; an empty list when there are none.
    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Todo>>;

    /// Overwrites the stored record with the same id. `NotFound` if absent.
    async fn update(&self, todo: &Todo) -> PortResult<()>;

    /// `NotFound` if absent.
    async fn delete(&self, id: Uuid) -> PortResult<()>;
}

/// The three calls of the GitHub OAuth web flow.
#[async_trait]
pub trait GitHubOAuthService: Send + Sync {
    /// The authorization URL the browser is redirected to.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> PortResult<String>;

    async fn fetch_user(&self, access_token: &str) -> PortResult<GitHubUser>;

    async fn fetch_emails(&self, access_token: &str) -> PortResult<Vec<GitHubEmail>>;
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
