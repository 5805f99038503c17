//! SQLite OrderStore implementation.

use std::path::Path;

use async_trait::async_trait;
use backon::Retryable;
use sea_query::SqliteQueryBuilder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use super::query::{self, OrderRow};
use super::schema::SQLITE_SCHEMA;
use super::{OrderStore, Result, StorageError};
use crate::model::{timestamp_now, NewOrder, Order, OrderItem, OrderStatus};
use crate::utils::retry::RetryPolicy;

/// SQLite implementation of OrderStore.
pub struct SqliteOrderStore {
    pool: SqlitePool,
}

impl SqliteOrderStore {
    /// Create a store over an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database file at `path`.
    pub async fn connect(path: &str, max_connections: u32, retry: &RetryPolicy) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Unavailable(e.to_string()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = (|| async {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options.clone())
                .await
        })
        .retry(retry.backoff())
        .notify(|err: &sqlx::Error, delay| {
            warn!(error = %err, ?delay, "sqlite not ready, backing off");
        })
        .await?;

        Ok(Self::new(pool))
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in SQLITE_SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the order row and its items within an already-started transaction.
    async fn insert_rows(
        conn: &mut SqliteConnection,
        order: &NewOrder,
        total: f64,
        now: &str,
    ) -> Result<i64> {
        let query =
            query::insert_order(order.customer_id, total, now).to_string(SqliteQueryBuilder);
        let row = sqlx::query(&query).fetch_one(&mut *conn).await?;
        let order_id: i64 = row.try_get(0)?;

        for item in &order.items {
            let query = query::insert_item(order_id, item, now).to_string(SqliteQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }

        Ok(order_id)
    }

    async fn fetch_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let query = query::select_items(order_id).to_string(SqliteQueryBuilder);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(OrderItem {
                id: row.try_get("id")?,
                order_id: row.try_get("order_id")?,
                menu_item_id: row.try_get("menu_item_id")?,
                quantity: row.try_get("quantity")?,
                price: row.try_get("price")?,
            });
        }

        Ok(items)
    }

    fn order_row(row: &SqliteRow) -> Result<OrderRow> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            status: row.try_get("status")?,
            total: row.try_get("total")?,
            created_at: query::text_timestamp(&row.try_get::<String, _>("created_at")?)?,
            updated_at: query::text_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }

    // One items query per order; fine at restaurant scale.
    async fn with_items(&self, rows: Vec<SqliteRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_row = Self::order_row(&row)?;
            let items = self.fetch_items(order_row.id).await?;
            orders.push(order_row.into_order(items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn insert_order(&self, order: &NewOrder, total: f64) -> Result<i64> {
        let now = timestamp_now();

        // BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
        // when concurrent DEFERRED transactions race to upgrade from shared to exclusive.
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = Self::insert_rows(&mut conn, order, total, &now).await;

        match result {
            Ok(order_id) => {
                if let Err(e) = sqlx::query("COMMIT").execute(&mut *conn).await {
                    let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                    return Err(e.into());
                }
                debug!(order_id, items = order.items.len(), "order committed");
                Ok(order_id)
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let query = query::select_order(id).to_string(SqliteQueryBuilder);
        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => {
                let order_row = Self::order_row(&row)?;
                let items = self.fetch_items(order_row.id).await?;
                Ok(Some(order_row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let query = query::select_orders().to_string(SqliteQueryBuilder);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        self.with_items(rows).await
    }

    async fn list_orders_by_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        let query = query::select_orders_by_customer(customer_id).to_string(SqliteQueryBuilder);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        self.with_items(rows).await
    }

    async fn order_exists(&self, id: i64) -> Result<bool> {
        let query = query::select_order_id(id).to_string(SqliteQueryBuilder);
        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<bool> {
        let query =
            query::update_status(id, status, &timestamp_now()).to_string(SqliteQueryBuilder);
        let result = sqlx::query(&query).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
