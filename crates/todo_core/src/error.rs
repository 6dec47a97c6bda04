//! crates/todo_core/src/error.rs
//!
//! The error taxonomy returned by the Todo and Auth services.

use crate::ports::PortError;

/// Every failure a service operation can report to its caller.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("User already exists")]
    AlreadyExists,
    /// Deliberately says nothing about which half of the credentials was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("You don't have permission to access this todo")]
    Permission,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid OAuth state")]
    InvalidState,
    #[error("Failed to exchange code for token: {0}")]
    OAuthExchange(String),
    #[error("Failed to get GitHub user: {0}")]
    ProfileFetch(String),
    #[error("Invalid identifier: {0}")]
    InvalidUuid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => ServiceError::NotFound(what),
            PortError::Unexpected(msg) => ServiceError::Unexpected(msg),
        }
    }
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;
