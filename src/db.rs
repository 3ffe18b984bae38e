pub mod mysql;
pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Backend, DatabaseConfig};
use crate::models::Visitor;

pub use mysql::MySqlVisitorStore;
pub use postgres::PgVisitorStore;
pub use sqlite::SqliteVisitorStore;

/// Append-only access to the `visitors` table.
#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Insert one row and return it as stored.
    async fn insert_visit(&self, visitor: &Visitor) -> Result<Visitor, sqlx::Error>;

    /// Every row, newest `timestamp` first.
    async fn list_visits(&self) -> Result<Vec<Visitor>, sqlx::Error>;

    async fn close(&self);

    fn backend(&self) -> Backend;
}

/// Open a pool for the configured backend and bootstrap its schema.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn VisitorStore>, sqlx::Error> {
    let store: Arc<dyn VisitorStore> = match config.backend {
        Backend::Postgres => {
            let store = PgVisitorStore::connect(config).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        Backend::MySql => {
            let store = MySqlVisitorStore::connect(config).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        Backend::Sqlite => {
            let store = SqliteVisitorStore::connect(config).await?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    info!("Connected to {} visitor store", store.backend());
    Ok(store)
}
