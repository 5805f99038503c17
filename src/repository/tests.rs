use std::time::Duration;

use super::*;
use crate::model::NewOrderItem;
use crate::notify::{FailingNotifier, RecordingNotifier};
use crate::storage::MockOrderStore;

fn item(menu_item_id: i64, quantity: i32, price: f64) -> NewOrderItem {
    NewOrderItem {
        menu_item_id,
        quantity,
        price,
    }
}

fn lunch_order() -> NewOrder {
    NewOrder::new(42, vec![item(1, 2, 9.50), item(2, 1, 3.00)])
}

fn repository() -> (Arc<MockOrderStore>, Arc<RecordingNotifier>, OrderRepository) {
    let store = Arc::new(MockOrderStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let repo = OrderRepository::new(store.clone(), notifier.clone());
    (store, notifier, repo)
}

#[tokio::test]
async fn test_create_computes_total_and_round_trips() {
    let (_, _, repo) = repository();

    let id = repo.create(lunch_order()).await.unwrap();
    let order = repo.get_by_id(id).await.unwrap();

    assert_eq!(order.customer_id, 42);
    assert_eq!(order.total, 22.00);
    assert_eq!(order.status, OrderStatus::Pending);
    let lines: Vec<(i64, i32, f64)> = order
        .items
        .iter()
        .map(|i| (i.menu_item_id, i.quantity, i.price))
        .collect();
    assert_eq!(lines, vec![(1, 2, 9.50), (2, 1, 3.00)]);
}

#[tokio::test]
async fn test_create_rejects_invalid_orders_before_writing() {
    let (store, _, repo) = repository();

    let cases = [
        NewOrder::new(0, vec![item(1, 1, 1.0)]),
        NewOrder::new(42, vec![]),
        NewOrder::new(42, vec![item(1, 0, 1.0)]),
        NewOrder::new(42, vec![item(1, 1, -1.0)]),
    ];
    for order in cases {
        let err = repo.create(order).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)), "got {:?}", err);
    }
    assert_eq!(store.order_count().await, 0);
}

#[tokio::test]
async fn test_create_item_failure_persists_nothing() {
    let (store, notifier, repo) = repository();
    store.set_fail_on_item(Some(1)).await;

    let err = repo.create(lunch_order()).await.unwrap_err();

    assert!(matches!(err, OrderError::Persistence(_)));
    assert_eq!(store.order_count().await, 0);
    assert_eq!(store.item_count().await, 0);
    assert!(repo.get_all().await.unwrap().is_empty());
    tokio::task::yield_now().await;
    assert!(notifier.drain().await.is_empty());
}

#[tokio::test]
async fn test_create_notifies_after_commit() {
    let (_, notifier, repo) = repository();

    let id = repo.create(lunch_order()).await.unwrap();

    let (event, text) = notifier.next().await.expect("notification sent");
    assert_eq!(event, ORDER_CREATED);
    assert_eq!(
        text,
        format!("order {} created for customer 42 (total 22.00)", id)
    );
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_create_or_update() {
    let store = Arc::new(MockOrderStore::new());
    let repo = OrderRepository::new(store.clone(), Arc::new(FailingNotifier));

    let id = repo.create(lunch_order()).await.unwrap();
    repo.update_status(id, "ready").await.unwrap();

    assert_eq!(repo.get_by_id(id).await.unwrap().status, OrderStatus::Ready);
}

#[tokio::test]
async fn test_create_completes_when_caller_stops_waiting() {
    let (store, _, repo) = repository();
    store.set_insert_delay(Some(Duration::from_millis(100))).await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), repo.create(lunch_order())).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.order_count().await, 1);
    assert_eq!(store.item_count().await, 2);
}

#[tokio::test]
async fn test_get_by_id_missing_is_not_found() {
    let (_, _, repo) = repository();
    assert_eq!(repo.get_by_id(77).await.unwrap_err(), OrderError::NotFound(77));
}

#[tokio::test]
async fn test_get_by_id_is_idempotent() {
    let (_, _, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();

    let first = repo.get_by_id(id).await.unwrap();
    let second = repo.get_by_id(id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_get_all_newest_first() {
    let (_, _, repo) = repository();
    let first = repo.create(lunch_order()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = repo
        .create(NewOrder::new(7, vec![item(5, 3, 1.25)]))
        .await
        .unwrap();

    let orders = repo.get_all().await.unwrap();
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert!(orders[0].created_at > orders[1].created_at);
    assert_eq!(orders[0].total, 3.75);
}

#[tokio::test]
async fn test_get_by_customer_filters() {
    let (_, _, repo) = repository();
    let mine = repo.create(lunch_order()).await.unwrap();
    repo.create(NewOrder::new(7, vec![item(5, 1, 1.0)]))
        .await
        .unwrap();

    let orders = repo.get_by_customer(42).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, mine);
    assert_eq!(orders[0].items.len(), 2);
}

#[tokio::test]
async fn test_update_status_changes_only_status() {
    let (_, notifier, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();
    let before = repo.get_by_id(id).await.unwrap();
    notifier.next().await;

    repo.update_status(id, "preparing").await.unwrap();

    let after = repo.get_by_id(id).await.unwrap();
    assert_eq!(after.status, OrderStatus::Preparing);
    assert_eq!(after.total, before.total);
    assert_eq!(after.items, before.items);
    assert!(after.updated_at >= before.updated_at);

    let (event, text) = notifier.next().await.expect("status notification");
    assert_eq!(event, ORDER_STATUS_CHANGED);
    assert_eq!(text, format!("order {} status changed to preparing", id));
}

#[tokio::test]
async fn test_update_status_rejects_unknown_status() {
    let (_, _, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();

    let err = repo.update_status(id, "shipped").await.unwrap_err();

    assert_eq!(err, OrderError::InvalidStatus("shipped".to_string()));
    assert_eq!(repo.get_by_id(id).await.unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_update_status_missing_order_is_not_found() {
    let (_, _, repo) = repository();
    assert_eq!(
        repo.update_status(9, "ready").await.unwrap_err(),
        OrderError::NotFound(9)
    );
    // Existence is checked before the status value.
    assert_eq!(
        repo.update_status(9, "shipped").await.unwrap_err(),
        OrderError::NotFound(9)
    );
}

#[tokio::test]
async fn test_terminal_status_can_be_left() {
    let (_, _, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();

    repo.update_status(id, "cancelled").await.unwrap();
    repo.update_status(id, "pending").await.unwrap();

    assert_eq!(repo.get_by_id(id).await.unwrap().status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_total_is_not_recomputed_on_update() {
    let (_, _, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();

    for status in OrderStatus::ALL {
        repo.update_status(id, status.as_str()).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap().total, 22.00);
    }
}

#[tokio::test]
async fn test_store_failures_surface_as_persistence() {
    let (store, _, repo) = repository();
    let id = repo.create(lunch_order()).await.unwrap();

    store.set_fail_on_update(true).await;
    assert!(matches!(
        repo.update_status(id, "ready").await,
        Err(OrderError::Persistence(_))
    ));

    store.set_fail_on_read(true).await;
    assert!(matches!(repo.get_all().await, Err(OrderError::Persistence(_))));
    assert!(matches!(repo.get_by_id(id).await, Err(OrderError::Persistence(_))));
}
