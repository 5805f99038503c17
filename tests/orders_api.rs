//! End-to-end tests: HTTP router over an on-disk SQLite store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use order_service::config::DEFAULT_BODY_LIMIT;
use order_service::handlers::router;
use order_service::repository::OrderRepository;
use order_service::storage::{OrderStore, SqliteOrderStore};
use order_service::utils::retry::RetryPolicy;

async fn open_store(dir: &TempDir) -> Arc<dyn OrderStore> {
    let path = dir.path().join("data").join("orders.db");
    let store = SqliteOrderStore::connect(path.to_str().unwrap(), 1, &RetryPolicy::no_retry())
        .await
        .expect("failed to open sqlite store");
    store.init_schema().await.expect("failed to init schema");
    Arc::new(store)
}

async fn app(dir: &TempDir) -> Router {
    let store = open_store(dir).await;
    let repo = Arc::new(OrderRepository::without_notifications(store));
    router(repo, DEFAULT_BODY_LIMIT)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn order_body(customer_id: i64) -> Value {
    json!({
        "customer_id": customer_id,
        "items": [
            {"menu_item_id": 1, "quantity": 2, "price": 9.50},
            {"menu_item_id": 2, "quantity": 1, "price": 3.00}
        ]
    })
}

#[tokio::test]
async fn test_order_lifecycle() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir).await;

    let (status, created) = call(&app, Method::POST, "/orders", Some(order_body(42))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["total"], 22.0);
    assert_eq!(created["data"]["status"], "pending");

    let (status, fetched) = call(&app, Method::GET, &format!("/orders/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);

    for next in ["preparing", "ready", "completed"] {
        let (status, updated) = call(
            &app,
            Method::PATCH,
            &format!("/orders/{}/status", id),
            Some(json!({"status": next})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["data"]["status"], next);
        assert_eq!(updated["data"]["total"], 22.0);
        assert_eq!(updated["data"]["items"], created["data"]["items"]);
    }

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/orders/{}/status", id),
        Some(json!({"status": "shipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], true);

    let (_, fetched) = call(&app, Method::GET, &format!("/orders/{}", id), None).await;
    assert_eq!(fetched["data"]["status"], "completed");
}

#[tokio::test]
async fn test_listing_and_customer_filter() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir).await;

    let (_, a) = call(&app, Method::POST, "/orders", Some(order_body(42))).await;
    let (_, b) = call(&app, Method::POST, "/orders", Some(order_body(7))).await;
    let (_, c) = call(&app, Method::POST, "/orders", Some(order_body(42))).await;

    let (status, all) = call(&app, Method::GET, "/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&Value> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| &o["id"])
        .collect();
    assert_eq!(ids, vec![&c["data"]["id"], &b["data"]["id"], &a["data"]["id"]]);

    let (status, mine) = call(&app, Method::GET, "/orders/customer/42", None).await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine["data"].as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|o| o["customer_id"] == 42));
    assert!(mine
        .iter()
        .all(|o| o["items"].as_array().unwrap().len() == 2));

    let (_, none) = call(&app, Method::GET, "/orders/customer/999", None).await;
    assert_eq!(none["data"], json!([]));
}

#[tokio::test]
async fn test_orders_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let app = app(&dir).await;
        let (_, created) = call(&app, Method::POST, "/orders", Some(order_body(42))).await;
        created["data"]["id"].as_i64().unwrap()
    };

    let app = app(&dir).await;
    let (status, fetched) = call(&app, Method::GET, &format!("/orders/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["total"], 22.0);
    assert_eq!(fetched["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_and_invalid_requests() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir).await;

    let (status, body) = call(&app, Method::GET, "/orders/12345", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "order not found: 12345");

    let empty = json!({"customer_id": 42, "items": []});
    let (status, _) = call(&app, Method::POST, "/orders", Some(empty)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, all) = call(&app, Method::GET, "/orders", None).await;
    assert_eq!(all["data"], json!([]));
}
