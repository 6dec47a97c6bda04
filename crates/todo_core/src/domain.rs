//! crates/todo_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

//=========================================================================================
// Todo
//=========================================================================================

/// A single todo item owned by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new, incomplete todo with a fresh id.
    pub fn new(user_id: Uuid, title: &str, description: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_complete(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.touch(now);
    }

    pub fn mark_incomplete(&mut self, now: DateTime<Utc>) {
        self.completed = false;
        self.touch(now);
    }

    /// Replaces the title and description.
    pub fn update(&mut self, title: &str, description: &str, now: DateTime<Utc>) {
        self.title = title.to_string();
        self.description = description.to_string();
        self.touch(now);
    }

    // updated_at must strictly advance, even for two edits within one clock tick.
    fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at + Duration::microseconds(1);
        self.updated_at = if now > floor { now } else { floor };
    }
}

//=========================================================================================
// Users and Sessions
//=========================================================================================

/// A registered account. Users created through GitHub have no password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Represents a browser login session (auth cookie)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// A session is usable through exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A pending GitHub authorization round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthState {
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OAuthState {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

//=========================================================================================
// GitHub Profile Records
//=========================================================================================

/// The subset of the GitHub `/user` payload the application cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// One entry of the GitHub `/user/emails` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubEmail {
    pub email: String,
    pub primary: bool,
    pub verified: bool,
}

/// Parses an identifier supplied by a caller.
pub fn parse_id(raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::InvalidUuid(raw.to_string()))
}
