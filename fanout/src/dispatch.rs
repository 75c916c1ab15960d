//! Outbound pipeline: an unbounded FIFO of pending frames drained by a single
//! dispatcher task.
//!
//! Producers (inbound handlers and `Manager::dispatch*` callers) only ever pay
//! for the enqueue. The one dispatcher performs every network send, so frames
//! for the same connection are never interleaved by concurrent writers.

use log::*;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connection::{Connection, Transport};

/// A frame waiting to be written to one connection.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub connection: Connection,
    pub frame: Arc<str>,
}

/// Producer half of the dispatch queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: UnboundedSender<PendingMessage>,
}

/// Consumer half of the dispatch queue, owned by the `Dispatcher`.
#[derive(Debug)]
pub struct DispatchReceiver {
    receiver: UnboundedReceiver<PendingMessage>,
}

/// Creates a connected queue/receiver pair.
pub fn channel() -> (DispatchQueue, DispatchReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (DispatchQueue { sender }, DispatchReceiver { receiver })
}

impl DispatchQueue {
    /// Appends a frame for `connection`. Returns false if the dispatcher has
    /// already shut down, in which case the frame is dropped.
    pub fn enqueue(&self, connection: Connection, frame: Arc<str>) -> bool {
        match self.sender.send(PendingMessage { connection, frame }) {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    "Dispatcher is gone; dropping frame for {}",
                    e.0.connection.id()
                );
                false
            }
        }
    }

    /// Enqueues the same frame once per connection, preserving iteration order.
    pub fn enqueue_all<I>(&self, connections: I, frame: Arc<str>) -> usize
    where
        I: IntoIterator<Item = Connection>,
    {
        let mut queued = 0;
        for connection in connections {
            if self.enqueue(connection, Arc::clone(&frame)) {
                queued += 1;
            }
        }
        queued
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl DispatchReceiver {
    /// Number of frames currently waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Drains the dispatch queue and writes each frame through the transport.
///
/// Delivery is best-effort and at-most-once: a failed send is logged and the
/// entry is dropped, never retried. The loop ends when the cancellation token
/// fires or every `DispatchQueue` handle is dropped; anything still queued at
/// that point is discarded.
pub struct Dispatcher {
    receiver: DispatchReceiver,
    transport: Arc<dyn Transport>,
    shutdown: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        receiver: DispatchReceiver,
        transport: Arc<dyn Transport>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            transport,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Dispatcher started");

        loop {
            let pending = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.receiver.receiver.recv() => match next {
                    Some(pending) => pending,
                    None => {
                        debug!("All dispatch queue handles dropped");
                        break;
                    }
                },
            };

            if self.shutdown.is_cancelled() {
                break;
            }

            trace!("Sending frame to {}", pending.connection);
            if let Err(e) = self
                .transport
                .send(&pending.connection, &pending.frame)
                .await
            {
                error!(
                    "Failed to deliver outgoing message to {}:{}: {}",
                    pending.connection.host(),
                    pending.connection.port(),
                    e
                );
            }
        }

        let discarded = self.receiver.len();
        self.receiver.receiver.close();
        info!("Dispatcher stopped; discarded {discarded} queued message(s)");
    }
}
