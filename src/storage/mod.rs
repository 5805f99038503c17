//! Order persistence.
//!
//! [`OrderStore`] is the sole writer of the `orders` and `order_items`
//! tables. Backends:
//! - `SqliteOrderStore`: SQLite (default feature)
//! - `PostgresOrderStore`: PostgreSQL
//! - `MockOrderStore`: in-memory, with fault injection for tests

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::{StorageConfig, StorageType};
use crate::model::{NewOrder, Order, OrderStatus};
use crate::utils::retry::RetryPolicy;

pub mod query;
pub mod schema;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteOrderStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresOrderStore;

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockOrderStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid timestamp in row: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid status in row: {0}")]
    InvalidStatus(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Interface for order persistence.
///
/// Implementations must apply `insert_order` atomically: either the order
/// row and every item row become visible together, or none do.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert the order (status `pending`) and all of its items in one
    /// transaction. Returns the assigned order id.
    async fn insert_order(&self, order: &NewOrder, total: f64) -> Result<i64>;

    /// Load an order with its items.
    async fn get_order(&self, id: i64) -> Result<Option<Order>>;

    /// All orders, newest first, items attached.
    async fn list_orders(&self) -> Result<Vec<Order>>;

    /// One customer's orders, newest first, items attached.
    async fn list_orders_by_customer(&self, customer_id: i64) -> Result<Vec<Order>>;

    /// Whether an order row with this id exists.
    async fn order_exists(&self, id: i64) -> Result<bool>;

    /// Set the status and refresh `updated_at`. Returns false when no row matched.
    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<bool>;
}

/// Initialize storage based on configuration.
///
/// Connects with `retry`, applies the schema, and returns the store.
pub async fn init_storage(
    config: &StorageConfig,
    retry: &RetryPolicy,
) -> std::result::Result<Arc<dyn OrderStore>, Box<dyn std::error::Error>> {
    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, "storage: sqlite");
            let store =
                SqliteOrderStore::connect(&config.sqlite.path, config.max_connections, retry)
                    .await?;
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            info!("storage: postgres");
            let store =
                PostgresOrderStore::connect(&config.postgres.uri, config.max_connections, retry)
                    .await?;
            store.init_schema().await?;
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => {
            error!(storage_type = ?other, "storage backend not enabled in this build");
            Err(format!("storage backend {:?} not enabled", other).into())
        }
    }
}
