//! Order query/command layer.
//!
//! [`OrderRepository`] validates input, computes the order total, delegates
//! persistence to an [`OrderStore`] and reports changes to a [`Notifier`].

mod error;

pub use error::OrderError;

use std::sync::Arc;

use tracing::{error, info};

use crate::model::{NewOrder, Order, OrderStatus};
use crate::notify::{self, Notifier, NoopNotifier, ORDER_CREATED, ORDER_STATUS_CHANGED};
use crate::storage::OrderStore;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Reads and writes order aggregates.
pub struct OrderRepository {
    store: Arc<dyn OrderStore>,
    notifier: Arc<dyn Notifier>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn OrderStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Repository that sends no notifications.
    pub fn without_notifications(store: Arc<dyn OrderStore>) -> Self {
        Self::new(store, Arc::new(NoopNotifier))
    }

    /// Create an order and all its items atomically. Returns the new order id.
    ///
    /// The total is computed from the submitted items before anything is
    /// written. The write runs on its own task so it finishes (commit or
    /// rollback) even if the caller stops waiting.
    #[tracing::instrument(
        name = "orders.create",
        skip_all,
        fields(customer_id = order.customer_id, items = order.items.len())
    )]
    pub async fn create(&self, order: NewOrder) -> Result<i64> {
        order.validate().map_err(OrderError::Validation)?;
        let total = order.total();

        let store = Arc::clone(&self.store);
        let customer_id = order.customer_id;
        let order_id = tokio::spawn(async move { store.insert_order(&order, total).await })
            .await
            .map_err(|e| {
                error!(error = %e, "order insert task failed");
                OrderError::Persistence("order insert task failed".to_string())
            })?
            .map_err(|e| {
                error!(error = %e, "order insert rolled back");
                OrderError::from(e)
            })?;

        info!(order_id, total, "order created");
        notify::dispatch(
            &self.notifier,
            ORDER_CREATED,
            format!(
                "order {} created for customer {} (total {:.2})",
                order_id, customer_id, total
            ),
        );

        Ok(order_id)
    }

    /// Load one order with its items.
    pub async fn get_by_id(&self, id: i64) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or(OrderError::NotFound(id))
    }

    /// Every order, newest first.
    pub async fn get_all(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_orders().await?)
    }

    /// One customer's orders, newest first.
    pub async fn get_by_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_by_customer(customer_id).await?)
    }

    /// Replace the status of an existing order.
    ///
    /// Any valid status may follow any other, terminal ones included.
    /// Concurrent updates to the same order are last-write-wins.
    #[tracing::instrument(name = "orders.update_status", skip(self))]
    pub async fn update_status(&self, id: i64, status: &str) -> Result<()> {
        if !self.store.order_exists(id).await? {
            return Err(OrderError::NotFound(id));
        }
        let status: OrderStatus = status.parse()?;

        if !self.store.update_status(id, status).await? {
            return Err(OrderError::NotFound(id));
        }

        info!(order_id = id, %status, "order status updated");
        notify::dispatch(
            &self.notifier,
            ORDER_STATUS_CHANGED,
            format!("order {} status changed to {}", id, status),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests;
