//! Order aggregate types.
//!
//! An [`Order`] exclusively owns its [`OrderItem`]s. Both are created together
//! from a [`NewOrder`] and only the status changes afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Any status may replace any other; no transition graph is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Every persistable status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// True for `completed` and `cancelled`. Informational only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A persisted order with its full item collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub status: OrderStatus,
    /// Snapshot of Σ price × quantity taken at creation.
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A persisted line item. `price` is the menu price at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i32,
    pub price: f64,
}

/// Inbound order creation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub customer_id: i64,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

/// Inbound line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub menu_item_id: i64,
    pub quantity: i32,
    pub price: f64,
}

impl NewOrderItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

impl NewOrder {
    pub fn new(customer_id: i64, items: Vec<NewOrderItem>) -> Self {
        Self { customer_id, items }
    }

    /// Sum of item subtotals in submission order.
    pub fn total(&self) -> f64 {
        self.items.iter().map(NewOrderItem::subtotal).sum()
    }

    /// Check required fields and per-item bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.customer_id == 0 {
            return Err("customer_id is required".to_string());
        }
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                return Err(format!("item {}: quantity must be positive", index));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(format!("item {}: price must be non-negative", index));
            }
        }
        if !self.total().is_finite() {
            return Err("order total out of range".to_string());
        }
        Ok(())
    }
}

/// Current time as stored in `created_at`/`updated_at` columns.
///
/// Fixed-width microsecond RFC 3339 so text ordering matches time ordering.
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}
