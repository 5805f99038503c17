//! Logger collaborator configuration.

use serde::Deserialize;

/// Where best-effort order notifications are sent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// When false, notifications are dropped.
    pub enabled: bool,
    /// URL accepting `POST {"name", "data"}`.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8005/log".to_string(),
            timeout_ms: 2000,
        }
    }
}
