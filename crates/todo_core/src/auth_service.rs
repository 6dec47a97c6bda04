//! crates/todo_core/src/auth_service.rs
//!
//! Registration, password login, session lifecycle and the GitHub OAuth flow.
//!
//! A session moves `Unauthenticated -> Authenticated(token)` on a successful
//! login or OAuth callback, and back on logout or expiry. Expiry is only ever
//! noticed lazily, when a token is looked up; there is no background sweep and
//! the TTL never slides.

use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use chrono::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::domain::{AuthSession, GitHubEmail, OAuthState, User};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, GitHubOAuthService, SystemClock};

/// Lifetime of a login session.
pub const SESSION_TTL_HOURS: i64 = 24;
/// Lifetime of an unanswered GitHub authorization request.
pub const OAUTH_STATE_TTL_MINUTES: i64 = 15;

pub struct AuthService {
    credentials: Arc<CredentialStore>,
    github: Arc<dyn GitHubOAuthService>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(credentials: Arc<CredentialStore>, github: Arc<dyn GitHubOAuthService>) -> Self {
        Self::with_clock(credentials, github, Arc::new(SystemClock))
    }

    pub fn with_clock(
        credentials: Arc<CredentialStore>,
        github: Arc<dyn GitHubOAuthService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            github,
            clock,
        }
    }

    //=====================================================================================
    // Password accounts
    //=====================================================================================

    /// Creates a password account. The email is the unique key.
    pub async fn register(&self, email: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ServiceError::Validation("email is required".to_string()));
        }
        if password.is_empty() {
            return Err(ServiceError::Validation("password is required".to_string()));
        }
        if self.credentials.user_by_email(&email).await.is_some() {
            return Err(ServiceError::AlreadyExists);
        }

        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: Some(hash_password(password.to_string()).await?),
            created_at: self.clock.now(),
        };

        // Re-checked under the write lock; a concurrent registration may have won.
        if !self.credentials.insert_user(user.clone()).await {
            return Err(ServiceError::AlreadyExists);
        }
        info!(user_id = %user.id, "Registered new user");
        Ok(user)
    }

    /// Verifies the password and mints a session.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        let email = normalize_email(email);
        let user = self.credentials.user_by_email(&email).await;
        // Accounts created through GitHub have no password to compare against.
        // Those and unknown emails still pay for one verification.
        let stored_hash = match user.as_ref().and_then(|u| u.password_hash.clone()) {
            Some(hash) => hash,
            None => dummy_hash().await?.to_string(),
        };
        let verified = verify_password(password, &stored_hash).await?;
        match user {
            Some(user) if verified && user.password_hash.is_some() => {
                Ok(self.issue_session(user.id).await)
            }
            _ => {
                warn!("Login rejected");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    //=====================================================================================
    // Sessions
    //=====================================================================================

    /// True iff the token names a session that has not expired yet.
    pub async fn verify_token(&self, token: &str) -> bool {
        match self.credentials.session(token).await {
            Some(session) => !session.is_expired_at(self.clock.now()),
            None => false,
        }
    }

    /// Resolves the user behind a token. An expired session is deleted here.
    pub async fn get_user(&self, token: &str) -> ServiceResult<User> {
        let session = match self.credentials.session(token).await {
            Some(session) if !session.is_expired_at(self.clock.now()) => session,
            Some(_) => {
                self.credentials.remove_session(token).await;
                return Err(ServiceError::InvalidCredentials);
            }
            None => return Err(ServiceError::InvalidCredentials),
        };

        self.credentials
            .user_by_id(session.user_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", session.user_id)))
    }

    pub async fn logout(&self, token: &str) -> ServiceResult<()> {
        match self.credentials.remove_session(token).await {
            Some(session) => {
                info!(user_id = %session.user_id, "Session closed");
                Ok(())
            }
            None => Err(ServiceError::NotFound("session".to_string())),
        }
    }

    async fn issue_session(&self, user_id: Uuid) -> AuthSession {
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: self.clock.now() + Duration::hours(SESSION_TTL_HOURS),
        };
        self.credentials.insert_session(session.clone()).await;
        session
    }

    //=====================================================================================
    // GitHub OAuth
    //=====================================================================================

    /// Stores a fresh state and returns `(authorization_url, state)`.
    pub async fn github_auth_url(&self) -> ServiceResult<(String, String)> {
        let state = random_state()?;
        let now = self.clock.now();
        self.credentials
            .insert_state(OAuthState {
                state: state.clone(),
                created_at: now,
                expires_at: now + Duration::minutes(OAUTH_STATE_TTL_MINUTES),
            })
            .await;
        Ok((self.github.authorize_url(&state), state))
    }

    /// Finishes the OAuth round-trip and mints a session.
    ///
    /// The state is consumed by the first attempt that presents it, whatever
    /// happens afterwards.
    pub async fn handle_github_callback(
        &self,
        code: &str,
        state: &str,
    ) -> ServiceResult<AuthSession> {
        match self.credentials.take_state(state).await {
            Some(entry) if !entry.is_expired_at(self.clock.now()) => {}
            _ => {
                warn!("Rejected unknown or expired OAuth state");
                return Err(ServiceError::InvalidState);
            }
        }
        if code.is_empty() {
            return Err(ServiceError::Validation(
                "missing authorization code".to_string(),
            ));
        }

        let access_token = self
            .github
            .exchange_code(code)
            .await
            .map_err(|e| ServiceError::OAuthExchange(e.to_string()))?;
        if access_token.is_empty() {
            return Err(ServiceError::OAuthExchange(
                "empty access token".to_string(),
            ));
        }

        let profile = self
            .github
            .fetch_user(&access_token)
            .await
            .map_err(|e| ServiceError::ProfileFetch(e.to_string()))?;

        let email = match profile.email.filter(|e| !e.trim().is_empty()) {
            Some(email) => email,
            None => {
                let emails = self
                    .github
                    .fetch_emails(&access_token)
                    .await
                    .map_err(|e| ServiceError::ProfileFetch(e.to_string()))?;
                primary_verified_email(&emails).ok_or_else(|| {
                    ServiceError::ProfileFetch("no primary verified email found".to_string())
                })?
            }
        };
        let email = normalize_email(&email);

        let now = self.clock.now();
        let (user, created) = self
            .credentials
            .find_or_insert_user(&email, || User {
                id: Uuid::new_v4(),
                email: email.clone(),
                password_hash: None,
                created_at: now,
            })
            .await;
        if created {
            info!(user_id = %user.id, github_login = %profile.login, "Created user from GitHub");
        }

        Ok(self.issue_session(user.id).await)
    }

    /// Drops a state whose authorization GitHub reported as failed.
    pub async fn discard_github_state(&self, state: &str) {
        if self.credentials.take_state(state).await.is_some() {
            info!("Discarded OAuth state after a refused authorization");
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn primary_verified_email(emails: &[GitHubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email.clone())
}

/// Argon2 is CPU bound, so hashing and verification leave the async workers.
async fn hash_password(password: String) -> ServiceResult<String> {
    blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                ServiceError::Unexpected("failed to hash password".to_string())
            })
    })
    .await
}

async fn verify_password(password: &str, stored_hash: &str) -> ServiceResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    blocking(move || {
        let parsed = PasswordHash::new(&stored_hash).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            ServiceError::Unexpected("authentication error".to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
}

async fn blocking<T, F>(work: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        error!("Password task failed: {}", e);
        ServiceError::Unexpected("authentication error".to_string())
    })?
}

/// Hash checked when there is no real one, so every rejected login costs the same.
async fn dummy_hash() -> ServiceResult<&'static str> {
    static DUMMY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DUMMY.get() {
        return Ok(hash);
    }
    let hash = hash_password(random_state()?).await?;
    Ok(DUMMY.get_or_init(|| hash))
}

/// 16 random bytes, hex encoded.
fn random_state() -> ServiceResult<String> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ServiceError::Unexpected(format!("failed to generate OAuth state: {}", e)))?;
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}
