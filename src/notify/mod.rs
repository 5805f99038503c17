//! Best-effort notifications to the logging collaborator.
//!
//! The repository reports `order_created` and `order_status_changed` events
//! through an injected [`Notifier`]. Delivery happens on a spawned task and
//! failures are logged and dropped; they never reach the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::LoggerConfig;

mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use http::HttpLogNotifier;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{FailingNotifier, RecordingNotifier};

/// Event name sent after an order and its items commit.
pub const ORDER_CREATED: &str = "order_created";
/// Event name sent after a status update.
pub const ORDER_STATUS_CHANGED: &str = "order_status_changed";

/// Errors that can occur when delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collaborator refused the entry (4xx other than 429).
    #[error("Notification rejected: {0}")]
    Rejected(String),

    /// The collaborator is overloaded or failing (5xx, 429).
    #[error("Logger unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget sink for `(event_name, text)` pairs.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &str, text: &str) -> Result<(), NotifyError>;

    /// Return the notifier name for logging.
    fn name(&self) -> &str;
}

/// Notifier that accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _event: &str, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Build the notifier described by `config`.
pub fn from_config(config: &LoggerConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    if !config.enabled {
        return Ok(Arc::new(NoopNotifier));
    }
    Ok(Arc::new(HttpLogNotifier::new(config)?))
}

/// Deliver a notification without blocking the caller.
///
/// Must be called from within a tokio runtime.
pub fn dispatch(notifier: &Arc<dyn Notifier>, event: &'static str, text: String) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        match notifier.notify(event, &text).await {
            Ok(()) => debug!(notifier = notifier.name(), event, "notification delivered"),
            Err(e) => warn!(
                notifier = notifier.name(),
                event,
                error = %e,
                "notification dropped"
            ),
        }
    });
}
