//! HTTP/JSON API for orders.
//!
//! Routes:
//! - `GET /ping`: liveness
//! - `GET /orders`: every order, newest first
//! - `GET /orders/:id`: one order
//! - `GET /orders/customer/:customer_id`: one customer's orders
//! - `POST /orders`: create an order (201)
//! - `PATCH /orders/:id/status`: replace an order's status
//!
//! Every order route answers with the [`Envelope`] shape
//! `{"error": bool, "message": string, "data"?: T}`.

mod orders;
mod response;

pub use response::{ApiError, Envelope};

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::repository::OrderRepository;

/// Shared state for axum handlers.
type AppState = Arc<OrderRepository>;

/// Start the HTTP server and run until Ctrl+C.
///
/// When the configured port is 0, the OS assigns an ephemeral port. The
/// actual bound port is always logged so it can be discovered.
pub async fn serve(
    config: &ServerConfig,
    repository: Arc<OrderRepository>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(repository, config.body_limit_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let actual_port = listener.local_addr()?.port();
    info!(port = actual_port, "order service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("order service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Build the axum router (separated for testing).
pub fn router(repository: Arc<OrderRepository>, body_limit: usize) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:id", get(orders::get))
        .route("/orders/customer/:customer_id", get(orders::list_by_customer))
        .route("/orders/:id/status", patch(orders::update_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(repository)
}

/// Browser callers on any http(s) origin, with credentials.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let origin = origin.as_bytes();
            origin.starts_with(b"http://") || origin.starts_with(b"https://")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300))
}

async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "Order service is running" }))
}
