//! Test notifiers.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use super::{Notifier, NotifyError};

/// Records every notification for later inspection.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(String, String)>,
    rx: Mutex<mpsc::UnboundedReceiver<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Wait up to one second for the next notification.
    pub async fn next(&self) -> Option<(String, String)> {
        let mut rx = self.rx.lock().await;
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Notifications already delivered, without waiting.
    pub async fn drain(&self) -> Vec<(String, String)> {
        let mut rx = self.rx.lock().await;
        let mut out = Vec::new();
        while let Ok(entry) = rx.try_recv() {
            out.push(entry);
        }
        out
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &str, text: &str) -> Result<(), NotifyError> {
        let _ = self.tx.send((event.to_string(), text.to_string()));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: &str, _text: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("logger unavailable".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
