//! services/api/src/adapters/memory.rs
//!
//! An in-memory implementation of the `TodoStore` port. One lock guards the
//! whole table; reads share it.

use std::collections::HashMap;

use async_trait::async_trait;
use todo_core::domain::Todo;
use todo_core::ports::{PortError, PortResult, TodoStore};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    todos: RwLock<HashMap<Uuid, Todo>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(id: Uuid) -> PortError {
    PortError::NotFound(format!("Todo {} not found", id))
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn create(&self, todo: &Todo) -> PortResult<()> {
        self.todos.write().await.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> PortResult<Todo> {
        self.todos
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn list_by_user(&self, user_id: Uuid) -> PortResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .todos
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        // newest first, matching the relational store
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn update(&self, todo: &Todo) -> PortResult<()> {
        let mut todos = self.todos.write().await;
        match todos.get_mut(&todo.id) {
            Some(existing) => {
                *existing = todo.clone();
                Ok(())
            }
            None => Err(not_found(todo.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> PortResult<()> {
        self.todos
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}
