pub mod auth_service;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod ports;
pub mod todo_service;

pub use auth_service::AuthService;
pub use credentials::CredentialStore;
pub use domain::{AuthSession, GitHubEmail, GitHubUser, OAuthState, Todo, User};
pub use error::{ServiceError, ServiceResult};
pub use ports::{Clock, GitHubOAuthService, PortError, PortResult, SystemClock, TodoStore};
pub use todo_service::TodoService;
