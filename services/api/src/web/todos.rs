//! services/api/src/web/todos.rs
//!
//! CRUD endpoints over the authenticated user's todos.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use todo_core::domain::parse_id;
use todo_core::Todo;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::state::{AppState, CurrentUser};

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TodoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            user_id: todo.user_id,
            title: todo.title,
            description: todo.description,
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct TodoRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the caller's todos, newest first.
#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "The caller's todos", body = [TodoResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_todos_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<TodoResponse>>, ApiError> {
    let todos = state.todos.list_todos(current.user.id).await?;
    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/todos",
    request_body = TodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoResponse),
        (status = 400, description = "Title is required")
    )
)]
pub async fn create_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<TodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let todo = state
        .todos
        .create_todo(current.user.id, &req.title, &req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 200, description = "The todo", body = TodoResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such todo")
    )
)]
pub async fn get_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state.todos.get_todo(parse_id(&id)?, current.user.id).await?;
    Ok(Json(todo.into()))
}

#[utoipa::path(
    put,
    path = "/todos/{id}",
    request_body = TodoRequest,
    params(("id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Title is required"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such todo")
    )
)]
pub async fn update_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(req): Json<TodoRequest>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .update_todo(parse_id(&id)?, current.user.id, &req.title, &req.description)
        .await?;
    Ok(Json(todo.into()))
}

#[utoipa::path(
    put,
    path = "/todos/{id}/complete",
    params(("id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo marked complete", body = TodoResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such todo")
    )
)]
pub async fn complete_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .complete_todo(parse_id(&id)?, current.user.id)
        .await?;
    Ok(Json(todo.into()))
}

#[utoipa::path(
    put,
    path = "/todos/{id}/incomplete",
    params(("id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 200, description = "Todo marked incomplete", body = TodoResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such todo")
    )
)]
pub async fn incomplete_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, ApiError> {
    let todo = state
        .todos
        .incomplete_todo(parse_id(&id)?, current.user.id)
        .await?;
    Ok(Json(todo.into()))
}

#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = Uuid, Path, description = "Todo id")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such todo")
    )
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .todos
        .delete_todo(parse_id(&id)?, current.user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
