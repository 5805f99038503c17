//! In-memory OrderStore for testing.
//!
//! Rows for a create are staged before anything is applied, so every
//! injected fault leaves the store exactly as it was.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{OrderStore, Result, StorageError};
use crate::model::{NewOrder, Order, OrderItem, OrderStatus};

#[derive(Default)]
struct MockState {
    orders: Vec<Order>,
    next_order_id: i64,
    next_item_id: i64,
}

/// Mock order store that keeps orders in memory.
#[derive(Default)]
pub struct MockOrderStore {
    state: RwLock<MockState>,
    fail_on_insert: RwLock<bool>,
    fail_on_item: RwLock<Option<usize>>,
    fail_on_read: RwLock<bool>,
    fail_on_update: RwLock<bool>,
    insert_delay: RwLock<Option<Duration>>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_insert(&self, fail: bool) {
        *self.fail_on_insert.write().await = fail;
    }

    /// Fail while writing the item at `index` (0-based), after the order row
    /// and earlier items were staged.
    pub async fn set_fail_on_item(&self, index: Option<usize>) {
        *self.fail_on_item.write().await = index;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    pub async fn set_fail_on_update(&self, fail: bool) {
        *self.fail_on_update.write().await = fail;
    }

    /// Sleep inside the write before applying it.
    pub async fn set_insert_delay(&self, delay: Option<Duration>) {
        *self.insert_delay.write().await = delay;
    }

    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn item_count(&self) -> usize {
        self.state
            .read()
            .await
            .orders
            .iter()
            .map(|o| o.items.len())
            .sum()
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("injected read failure".to_string()));
        }
        Ok(())
    }

    fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        orders
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn insert_order(&self, order: &NewOrder, total: f64) -> Result<i64> {
        if *self.fail_on_insert.read().await {
            return Err(StorageError::Unavailable("injected insert failure".to_string()));
        }
        let fail_on_item = *self.fail_on_item.read().await;
        let delay = *self.insert_delay.read().await;

        let mut state = self.state.write().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let now = Utc::now();
        let order_id = state.next_order_id + 1;
        let mut next_item_id = state.next_item_id;
        let mut items = Vec::with_capacity(order.items.len());

        for (index, item) in order.items.iter().enumerate() {
            if fail_on_item == Some(index) {
                return Err(StorageError::Unavailable(format!(
                    "injected failure on item {}",
                    index
                )));
            }
            next_item_id += 1;
            items.push(OrderItem {
                id: next_item_id,
                order_id,
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                price: item.price,
            });
        }

        state.next_order_id = order_id;
        state.next_item_id = next_item_id;
        state.orders.push(Order {
            id: order_id,
            customer_id: order.customer_id,
            status: OrderStatus::Pending,
            total,
            created_at: now,
            updated_at: now,
            items,
        });

        Ok(order_id)
    }

    async fn get_order(&self, id: i64) -> Result<Option<Order>> {
        self.check_read().await?;
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.check_read().await?;
        let orders = self.state.read().await.orders.clone();
        Ok(Self::newest_first(orders))
    }

    async fn list_orders_by_customer(&self, customer_id: i64) -> Result<Vec<Order>> {
        self.check_read().await?;
        let orders = self
            .state
            .read()
            .await
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(orders))
    }

    async fn order_exists(&self, id: i64) -> Result<bool> {
        self.check_read().await?;
        Ok(self.state.read().await.orders.iter().any(|o| o.id == id))
    }

    async fn update_status(&self, id: i64, status: OrderStatus) -> Result<bool> {
        if *self.fail_on_update.read().await {
            return Err(StorageError::Unavailable("injected update failure".to_string()));
        }
        let mut state = self.state.write().await;
        match state.orders.iter_mut().find(|o| o.id == id) {
            Some(order) => {
                order.status = status;
                order.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
