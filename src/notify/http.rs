//! HTTP notifier for the logger service.
//!
//! POSTs `{"name": <event>, "data": <text>}` as JSON to the configured
//! endpoint.

use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::debug;

use super::{Notifier, NotifyError};
use crate::config::LoggerConfig;
use crate::utils::retry::notify_backoff;

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    name: &'a str,
    data: &'a str,
}

/// Notifier posting to the logger service's `/log` endpoint.
pub struct HttpLogNotifier {
    client: Client,
    endpoint: String,
}

impl HttpLogNotifier {
    pub fn new(config: &LoggerConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Retry timeouts, connection errors and overloaded collaborators.
    fn is_retryable(err: &NotifyError) -> bool {
        match err {
            NotifyError::Http(e) => e.is_timeout() || e.is_connect(),
            NotifyError::Unavailable(_) => true,
            NotifyError::Rejected(_) => false,
        }
    }

    async fn post(&self, entry: &LogEntry<'_>) -> Result<(), NotifyError> {
        let response = self.client.post(&self.endpoint).json(entry).send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(endpoint = %self.endpoint, event = entry.name, "log entry accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let message = format!(
            "HTTP {} - {}",
            status,
            body.chars().take(200).collect::<String>()
        );
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            Err(NotifyError::Unavailable(message))
        } else {
            Err(NotifyError::Rejected(message))
        }
    }
}

#[async_trait]
impl Notifier for HttpLogNotifier {
    async fn notify(&self, event: &str, text: &str) -> Result<(), NotifyError> {
        let entry = LogEntry {
            name: event,
            data: text,
        };

        (|| async { self.post(&entry).await })
            .retry(notify_backoff())
            .when(Self::is_retryable)
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
