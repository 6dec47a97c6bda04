//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::web::cookies::{clear_cookie, read_token, AUTH_COOKIE};
use crate::web::state::{AppState, CurrentUser};

/// Middleware that validates the session token and resolves the user.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized and clears the auth cookie.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    // 1. Extract the token from the cookie or bearer header
    let Some(token) = read_token(req.headers()).map(str::to_string) else {
        debug!("Request without session token");
        return ApiError::Unauthorized.into_response();
    };

    // 2. Resolve the user; an expired session is dropped here
    let user = match state.auth.get_user(&token).await {
        Ok(user) => user,
        Err(e) => {
            debug!("Rejected session: {}", e);
            return unauthorized(state.config.cookie_secure);
        }
    };

    // 3. Insert the user into request extensions
    req.extensions_mut().insert(CurrentUser { user, token });

    // 4. Continue to the handler
    next.run(req).await
}

fn unauthorized(secure: bool) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clear_cookie(AUTH_COOKIE, secure))]),
        ApiError::Unauthorized,
    )
        .into_response()
}
