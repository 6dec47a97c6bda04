//! crates/todo_core/src/todo_service.rs
//!
//! Ownership and validation rules on top of a `TodoStore`.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::Todo;
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{Clock, SystemClock, TodoStore};

/// Todo operations on behalf of an authenticated user.
///
/// Every read or write of a single todo fetches it first and compares its
/// `user_id` with the caller. There is no version field, so a concurrent
/// update and delete of the same todo race and the last writer wins.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn TodoStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list_todos(&self, user_id: Uuid) -> ServiceResult<Vec<Todo>> {
        Ok(self.store.list_by_user(user_id).await?)
    }

    pub async fn get_todo(&self, todo_id: Uuid, user_id: Uuid) -> ServiceResult<Todo> {
        self.owned(todo_id, user_id).await
    }

    pub async fn create_todo(
        &self,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> ServiceResult<Todo> {
        require_title(title)?;
        let todo = Todo::new(user_id, title, description, self.clock.now());
        self.store.create(&todo).await?;
        debug!(todo_id = %todo.id, user_id = %user_id, "Created todo");
        Ok(todo)
    }

    pub async fn update_todo(
        &self,
        todo_id: Uuid,
        user_id: Uuid,
        title: &str,
        description: &str,
    ) -> ServiceResult<Todo> {
        require_title(title)?;
        let mut todo = self.owned(todo_id, user_id).await?;
        todo.update(title, description, self.clock.now());
        self.store.update(&todo).await?;
        Ok(todo)
    }

    pub async fn complete_todo(&self, todo_id: Uuid, user_id: Uuid) -> ServiceResult<Todo> {
        self.set_completed(todo_id, user_id, true).await
    }

    pub async fn incomplete_todo(&self, todo_id: Uuid, user_id: Uuid) -> ServiceResult<Todo> {
        self.set_completed(todo_id, user_id, false).await
    }

    pub async fn delete_todo(&self, todo_id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        self.owned(todo_id, user_id).await?;
        self.store.delete(todo_id).await?;
        debug!(todo_id = %todo_id, user_id = %user_id, "Deleted todo");
        Ok(())
    }

    async fn set_completed(
        &self,
        todo_id: Uuid,
        user_id: Uuid,
        completed: bool,
    ) -> ServiceResult<Todo> {
        let mut todo = self.owned(todo_id, user_id).await?;
        let now = self.clock.now();
        if completed {
            todo.mark_complete(now);
        } else {
            todo.mark_incomplete(now);
        }
        self.store.update(&todo).await?;
        Ok(todo)
    }

    /// Fetches the todo and checks that `user_id` owns it.
    async fn owned(&self, todo_id: Uuid, user_id: Uuid) -> ServiceResult<Todo> {
        let todo = self.store.get(todo_id).await?;
        if todo.user_id != user_id {
            warn!(todo_id = %todo_id, user_id = %user_id, "Rejected access to another user's todo");
            return Err(ServiceError::Permission);
        }
        Ok(todo)
    }
}

fn require_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title cannot be empty".to_string()));
    }
    Ok(())
}
