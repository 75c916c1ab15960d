//! Transport double shared by the crate's unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::connection::{Connection, ConnectionId, Transport};
use crate::error::{transport_error, Result, TransportErrorKind};

/// Records every frame it is asked to send; fails for selected connections.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<(ConnectionId, String)>>,
    failing: HashSet<ConnectionId>,
    notify: Notify,
}

impl RecordingTransport {
    pub(crate) fn failing_for(ids: &[ConnectionId]) -> Self {
        Self {
            failing: ids.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<(ConnectionId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn frames_for(&self, connection: &Connection) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == connection.id())
            .map(|(_, frame)| frame)
            .collect()
    }

    /// Waits until at least `count` frames were delivered, panicking on timeout.
    pub(crate) async fn wait_for(&self, count: usize, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.sent.lock().unwrap().len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {count} frame(s), got {}",
                self.sent.lock().unwrap().len()
            )
        });
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, connection: &Connection, frame: &str) -> Result<()> {
        if self.failing.contains(&connection.id()) {
            return Err(transport_error(TransportErrorKind::Send, "simulated failure"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((connection.id(), frame.to_string()));
        self.notify.notify_waiters();
        Ok(())
    }
}
