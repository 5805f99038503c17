//! order-service: restaurant order API
//!
//! Serves the order HTTP/JSON API over a SQLite or PostgreSQL store.
//!
//! ## Configuration
//! - `config.yaml` in the working directory, `--config <path>`, or the file
//!   named by ORDER_SERVICE_CONFIG
//! - ORDER_SERVICE__SECTION__KEY environment overrides
//!   (e.g. ORDER_SERVICE__SERVER__PORT=8004)
//! - ORDER_SERVICE_LOG: tracing filter (default: info)

use std::sync::Arc;

use tracing::info;

use order_service::config::Config;
use order_service::handlers;
use order_service::notify;
use order_service::repository::OrderRepository;
use order_service::storage::init_storage;
use order_service::utils::bootstrap::{init_tracing, parse_config_path};
use order_service::utils::retry::RetryPolicy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_path = parse_config_path();
    let config = Config::load(config_path.as_deref())?;

    let retry = RetryPolicy::from(&config.storage.connect_retry);
    let store = init_storage(&config.storage, &retry).await?;

    let notifier = notify::from_config(&config.logger)?;
    info!(notifier = notifier.name(), "notifications configured");

    let repository = Arc::new(OrderRepository::new(store, notifier));

    handlers::serve(&config.server, repository)
        .await
        .map_err(|e| e as Box<dyn std::error::Error>)?;

    Ok(())
}
