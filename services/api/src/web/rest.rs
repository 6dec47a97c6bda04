//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health probe.

use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, todos};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::github_login_handler,
        auth::github_callback_handler,
        todos::list_todos_handler,
        todos::create_todo_handler,
        todos::get_todo_handler,
        todos::update_todo_handler,
        todos::complete_todo_handler,
        todos::incomplete_todo_handler,
        todos::delete_todo_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserResponse,
            auth::SessionResponse,
            todos::TodoRequest,
            todos::TodoResponse,
        )
    ),
    tags(
        (name = "Todo API", description = "Accounts, sessions and personal todo lists.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/auth/register",
            "/auth/login",
            "/auth/logout",
            "/auth/me",
            "/auth/github",
            "/auth/github/callback",
            "/todos",
            "/todos/{id}",
            "/todos/{id}/complete",
            "/todos/{id}/incomplete",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{} is undocumented", path);
        }
    }
}
