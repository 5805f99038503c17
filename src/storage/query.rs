//! Backend-neutral statement builders.
//!
//! Each backend renders these with its own sea-query builder
//! (`SqliteQueryBuilder`, `PostgresQueryBuilder`) and decodes rows into
//! [`OrderRow`] before assembling the aggregate.

use chrono::{DateTime, Utc};
use sea_query::{
    Expr, InsertStatement, Order as SortOrder, Query, SelectStatement, UpdateStatement,
};

use super::schema::{OrderItems, Orders};
use super::{Result, StorageError};
use crate::model::{parse_timestamp, NewOrderItem, Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: [Orders; 6] = [
    Orders::Id,
    Orders::CustomerId,
    Orders::Status,
    Orders::Total,
    Orders::CreatedAt,
    Orders::UpdatedAt,
];

const ITEM_COLUMNS: [OrderItems; 5] = [
    OrderItems::Id,
    OrderItems::OrderId,
    OrderItems::MenuItemId,
    OrderItems::Quantity,
    OrderItems::Price,
];

/// Insert a pending order row, returning its id.
pub fn insert_order(customer_id: i64, total: f64, now: &str) -> InsertStatement {
    Query::insert()
        .into_table(Orders::Table)
        .columns([
            Orders::CustomerId,
            Orders::Status,
            Orders::Total,
            Orders::CreatedAt,
            Orders::UpdatedAt,
        ])
        .values_panic([
            customer_id.into(),
            OrderStatus::Pending.as_str().into(),
            total.into(),
            now.into(),
            now.into(),
        ])
        .returning_col(Orders::Id)
        .to_owned()
}

/// Insert one line item belonging to `order_id`.
pub fn insert_item(order_id: i64, item: &NewOrderItem, now: &str) -> InsertStatement {
    Query::insert()
        .into_table(OrderItems::Table)
        .columns([
            OrderItems::OrderId,
            OrderItems::MenuItemId,
            OrderItems::Quantity,
            OrderItems::Price,
            OrderItems::CreatedAt,
            OrderItems::UpdatedAt,
        ])
        .values_panic([
            order_id.into(),
            item.menu_item_id.into(),
            item.quantity.into(),
            item.price.into(),
            now.into(),
            now.into(),
        ])
        .to_owned()
}

fn orders_newest_first() -> SelectStatement {
    Query::select()
        .columns(ORDER_COLUMNS)
        .from(Orders::Table)
        .order_by(Orders::CreatedAt, SortOrder::Desc)
        .order_by(Orders::Id, SortOrder::Desc)
        .to_owned()
}

pub fn select_orders() -> SelectStatement {
    orders_newest_first()
}

pub fn select_orders_by_customer(customer_id: i64) -> SelectStatement {
    orders_newest_first()
        .and_where(Expr::col(Orders::CustomerId).eq(customer_id))
        .to_owned()
}

pub fn select_order(id: i64) -> SelectStatement {
    Query::select()
        .columns(ORDER_COLUMNS)
        .from(Orders::Table)
        .and_where(Expr::col(Orders::Id).eq(id))
        .to_owned()
}

pub fn select_order_id(id: i64) -> SelectStatement {
    Query::select()
        .column(Orders::Id)
        .from(Orders::Table)
        .and_where(Expr::col(Orders::Id).eq(id))
        .to_owned()
}

/// Items of one order in submission order.
pub fn select_items(order_id: i64) -> SelectStatement {
    Query::select()
        .columns(ITEM_COLUMNS)
        .from(OrderItems::Table)
        .and_where(Expr::col(OrderItems::OrderId).eq(order_id))
        .order_by(OrderItems::Id, SortOrder::Asc)
        .to_owned()
}

pub fn update_status(id: i64, status: OrderStatus, now: &str) -> UpdateStatement {
    Query::update()
        .table(Orders::Table)
        .values([
            (Orders::Status, status.as_str().into()),
            (Orders::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(Orders::Id).eq(id))
        .to_owned()
}

/// Decode a timestamp stored as RFC 3339 text (SQLite).
pub fn text_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}

/// Raw `orders` row, before the status is parsed.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: i64,
    pub customer_id: i64,
    pub status: String,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Attach items and parse the status column.
    pub fn into_order(self, items: Vec<OrderItem>) -> Result<Order> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(|_| StorageError::InvalidStatus(self.status.clone()))?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            status,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{PostgresQueryBuilder, SqliteQueryBuilder};

    fn row(status: &str) -> OrderRow {
        let at = text_timestamp("2024-05-01T12:00:00.000000Z").unwrap();
        OrderRow {
            id: 1,
            customer_id: 42,
            status: status.to_string(),
            total: 22.0,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_insert_order_returns_id() {
        let sql =
            insert_order(42, 22.0, "2024-01-01T00:00:00.000000Z").to_string(SqliteQueryBuilder);
        assert!(sql.starts_with(r#"INSERT INTO "orders""#));
        assert!(sql.contains("'pending'"));
        assert!(sql.ends_with(r#"RETURNING "id""#));
    }

    #[test]
    fn test_select_orders_sorted_newest_first() {
        let sql = select_orders().to_string(PostgresQueryBuilder);
        assert!(sql.ends_with(r#"ORDER BY "created_at" DESC, "id" DESC"#));
    }

    #[test]
    fn test_select_by_customer_filters() {
        let sql = select_orders_by_customer(7).to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#"WHERE "customer_id" = 7"#));
        assert!(sql.contains("ORDER BY"));
    }

    #[test]
    fn test_update_status_touches_updated_at() {
        let sql = update_status(3, OrderStatus::Ready, "2024-01-01T00:00:00.000000Z")
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""status" = 'ready'"#));
        assert!(sql.contains(r#""updated_at" = '2024-01-01T00:00:00.000000Z'"#));
        assert!(sql.contains(r#"WHERE "id" = 3"#));
    }

    #[test]
    fn test_row_into_order() {
        let order = row("preparing").into_order(vec![]).unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_row_with_unknown_status_is_rejected() {
        let err = row("shipped").into_order(vec![]).unwrap_err();
        assert!(matches!(err, StorageError::InvalidStatus(s) if s == "shipped"));
    }

    #[test]
    fn test_bad_text_timestamp_is_rejected() {
        let err = text_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, StorageError::InvalidTimestamp(s) if s == "yesterday"));
    }
}
