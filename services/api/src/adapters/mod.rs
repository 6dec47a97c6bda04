pub mod db;
pub mod github;
pub mod memory;

pub use db::DbAdapter;
pub use github::GitHubOAuthAdapter;
pub use memory::MemoryTodoStore;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use todo_core::ports::TodoStore;
use tracing::info;

use crate::config::{DatabaseSettings, StorageBackend};
use crate::error::ApiError;

/// Builds the todo store selected by the configuration.
///
/// For Postgres this connects the pool and applies pending migrations before
/// returning.
pub async fn build_todo_store(
    backend: &StorageBackend,
    database: &DatabaseSettings,
) -> Result<Arc<dyn TodoStore>, ApiError> {
    match backend {
        StorageBackend::Memory => {
            info!("Using in-memory todo repository");
            Ok(Arc::new(MemoryTodoStore::new()))
        }
        StorageBackend::Postgres { database_url } => {
            info!("Using Postgres todo repository");
            info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(database.timeout)
                .connect(database_url)
                .await?;
            let adapter = DbAdapter::new(pool);
            info!("Running database migrations...");
            adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Ok(Arc::new(adapter))
        }
    }
}
