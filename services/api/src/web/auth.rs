//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, password login, logout and the
//! GitHub OAuth round-trip.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use todo_core::{AuthSession, ServiceError, User};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::cookies::{
    clear_cookie, read_cookie, read_token, set_cookie, AUTH_COOKIE, STATE_COOKIE,
    STATE_COOKIE_MAX_AGE_SECS,
};
use crate::web::state::{AppState, CurrentUser};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Missing fields deserialize as empty so the service reports them.
#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A user as exposed over the API. The password hash never leaves the server.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GitHubCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn session_cookie(session: &AuthSession, secure: bool) -> String {
    let max_age = (session.expires_at - Utc::now()).num_seconds();
    set_cookie(AUTH_COOKIE, &session.token, max_age, secure)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new password account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Missing email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.register(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.auth.login(&req.email, &req.password).await?;
    let cookie = session_cookie(&session, state.config.cookie_secure);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            token: session.token,
            user_id: session.user_id,
            expires_at: session.expires_at,
        }),
    ))
}

/// POST /auth/logout - Invalidate the session
///
/// The auth cookie is cleared even when the session was already gone.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = read_token(&headers) {
        if let Err(e) = state.auth.logout(token).await {
            debug!("Logout of unknown session: {}", e);
        }
    }
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_cookie(AUTH_COOKIE, state.config.cookie_secure))],
    )
        .into_response()
}

/// GET /auth/me - The authenticated user
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(current): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse::from(current.user))
}

/// GET /auth/github - Start the GitHub OAuth flow
#[utoipa::path(
    get,
    path = "/auth/github",
    responses(
        (status = 302, description = "Redirect to GitHub")
    )
)]
pub async fn github_login_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let (url, oauth_state) = state.auth.github_auth_url().await?;
    let cookie = set_cookie(
        STATE_COOKIE,
        &oauth_state,
        STATE_COOKIE_MAX_AGE_SECS,
        state.config.cookie_secure,
    );
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, url), (header::SET_COOKIE, cookie)],
    ))
}

/// GET /auth/github/callback - Finish the GitHub OAuth flow
#[utoipa::path(
    get,
    path = "/auth/github/callback",
    params(GitHubCallbackParams),
    responses(
        (status = 302, description = "Logged in, redirect to the application"),
        (status = 400, description = "Invalid OAuth state or missing code"),
        (status = 502, description = "GitHub exchange or profile fetch failed")
    )
)]
pub async fn github_callback_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<GitHubCallbackParams>,
) -> Response {
    let secure = state.config.cookie_secure;

    // The browser must present the same state it was handed on the way out.
    let query_state = params.state.unwrap_or_default();
    let cookie_state = read_cookie(&headers, STATE_COOKIE).unwrap_or_default();
    if query_state.is_empty() || cookie_state != query_state {
        warn!("OAuth callback state does not match cookie");
        return ApiError::Service(ServiceError::InvalidState).into_response();
    }

    let clear_state = clear_cookie(STATE_COOKIE, secure);

    if let Some(error) = params.error {
        warn!(error = %error, "GitHub returned an authorization error");
        state.auth.discard_github_state(&query_state).await;
        return (
            AppendHeaders([(header::SET_COOKIE, clear_state)]),
            ApiError::BadRequest(format!("GitHub authorization failed: {}", error)),
        )
            .into_response();
    }
    // An empty code still consumes the state inside the service.
    let code = params.code.unwrap_or_default();

    match state.auth.handle_github_callback(&code, &query_state).await {
        Ok(session) => {
            info!(user_id = %session.user_id, "GitHub login succeeded");
            (
                StatusCode::FOUND,
                AppendHeaders([
                    (header::SET_COOKIE, clear_state),
                    (header::SET_COOKIE, session_cookie(&session, secure)),
                    (header::LOCATION, state.config.login_redirect.clone()),
                ]),
            )
                .into_response()
        }
        Err(e) => (
            AppendHeaders([(header::SET_COOKIE, clear_state)]),
            ApiError::from(e),
        )
            .into_response(),
    }
}
