//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the relational
//! implementation of the `TodoStore` port from the `core` crate. It handles all
//! interactions with the PostgreSQL `todos` table using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use todo_core::domain::Todo;
use todo_core::ports::{PortError, PortResult, TodoStore};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `TodoStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TodoRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl TodoRecord {
    fn to_domain(self) -> Todo {
        Todo {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const TODO_COLUMNS: &str = "id, user_id, title, description, completed, created_at, updated_at";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `TodoStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TodoStore for DbAdapter {
    async fn create(&self, todo: &Todo) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO todos (id, user_id, title, description, completed, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(todo.id)
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PortResult<Todo> {
        let record = sqlx::query_as::<_, TodoRecord>(&format!(
            "SELECT {} FROM todos WHERE id = $1",
            TODO_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Todo {} not found", id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Todo>> {
        let records = sqlx::query_as::<_, TodoRecord>(&format!(
            "SELECT {} FROM todos WHERE user_id = $1 ORDER BY created_at DESC",
            TODO_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let todos = records.into_iter().map(|r| r.to_domain()).collect();
        Ok(todos)
    }

    async fn update(&self, todo: &Todo) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE todos SET title = $2, description = $3, completed = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(todo.id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(todo.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Todo {} not found", todo.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Todo {} not found", id)));
        }
        Ok(())
    }
}
