//! PostgreSQL OrderStore implementation.

use async_trait::async_trait;
use backon::Retryable;
use sea_query::PostgresQueryBuilder;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, warn};

use super::query::{self, OrderRow};
use super::schema::POSTGRES_SCHEMA;
use super::{OrderStore, Result};
use crate::model::{timestamp_now, NewOrder, Order, OrderItem, OrderStatus};
use crate::utils::retry::RetryPolicy;

/// PostgreSQL implementation of OrderStore.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Create a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `uri`, retrying while the server comes up.
    pub async fn connect(uri: &str, max_connections: u32, retry: &RetryPolicy) -> Result<Self> {
        let pool = (|| async {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect(uri)
                .await
        })
        .retry(retry.backoff())
        .notify(|err: &sqlx::Error, delay| {
            warn!(error = %err, ?delay, "postgres not ready, backing off");
        })
        .await?;

        Ok(Self::new(pool))
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> Result<()> {
        for statement in POSTGRES_SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn insert_rows(
        conn: &mut PgConnection,
        order: &NewOrder,
        total: f64,
        now: &str,
    ) -> Result<i64> {
        let query =
            query::insert_order(order.customer_id, total, now).to_string(PostgresQueryBuilder);
        let row = sqlx::query(&query).fetch_one(&mut *conn).await?;
        let order_id: i64 = row.try_get(0)?;

        for item in &order.items {
            let query = query::insert_item(order_id, item, now).to_string(PostgresQueryBuilder);
            sqlx::query(&query).execute(&mut *conn).await?;
        }

        Ok(order_id)
    }

    async fn fetch_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let query = query::select_items(order_id).to_string(PostgresQueryBuilder);
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

    fn order_row(row: &PgRow) -> Result<OrderRow> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            status: row.try_get("status")?,
            total: row.try_get("total")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn with_items(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
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
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, order: &NewOrder, total: f64) -> Result<i64> {
        let now = timestamp_now();

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;
        let order_id = Self::insert_rows(&mut tx, order, total, &now).await?;
        tx.commit().await?;

        debug!(order_id, items = order.items.len(), "order committed");
        Ok(order_id)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let query = query::select_order(id).to_string(PostgresQueryBuilder);
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
        let query = query::select_orders().to_string(PostgresQueryBuilder);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        self.with_items(rows).await
    }

    async fn list_orders_by_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        let query = query::select_orders_by_customer(customer_id).to_string(PostgresQueryBuilder);
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        self.with_items(rows).await
    }

    async fn order_exists(&self, id: i64) -> Result<bool> {
        let query = query::select_order_id(id).to_string(PostgresQueryBuilder);
        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;
        Ok(row.is_some())
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<bool> {
        let query =
            query::update_status(id, status, &timestamp_now()).to_string(PostgresQueryBuilder);
        let result = sqlx::query(&query).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
