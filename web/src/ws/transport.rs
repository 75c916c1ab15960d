use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use fanout::error::{transport_error, Error, ErrorKind, Result, TransportErrorKind};
use fanout::{Connection, ConnectionId, Transport};
use futures::stream::SplitSink;
use futures::{Sink, SinkExt};
use log::*;
use std::error::Error as StdError;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Write half of an upgraded socket.
pub type SocketSink = SplitSink<WebSocket, Message>;

/// `Transport` over the write halves of live WebSocket connections.
///
/// The read half of each socket stays with its connection task; the write half
/// is parked here so the dispatcher can reach it by connection id.
pub struct WsTransport<S = SocketSink> {
    sinks: DashMap<ConnectionId, Arc<Mutex<S>>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S> WsTransport<S> {
    pub fn register(&self, id: ConnectionId, sink: S) {
        self.sinks.insert(id, Arc::new(Mutex::new(sink)));
    }

    pub fn unregister(&self, id: &ConnectionId) {
        if self.sinks.remove(id).is_none() {
            debug!("No socket registered for connection {id}");
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<S> Default for WsTransport<S> {
    fn default() -> Self {
        Self {
            sinks: DashMap::new(),
        }
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: StdError + Send + Sync + 'static,
{
    async fn send(&self, connection: &Connection, frame: &str) -> Result<()> {
        // Clone the handle out so the map shard is not held across the write.
        let sink = self
            .sinks
            .get(&connection.id())
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                transport_error(TransportErrorKind::Closed, "no open socket for connection")
            })?;

        let mut sink = sink.lock().await;
        sink.send(Message::Text(frame.into()))
            .await
            .map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Transport(TransportErrorKind::Send),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use futures::StreamExt;
    use std::net::SocketAddr;

    type TestSink = mpsc::UnboundedSender<Message>;

    fn conn() -> Connection {
        Connection::new(SocketAddr::from(([127, 0, 0, 1], 4100)))
    }

    #[tokio::test]
    async fn test_send_writes_text_frame_to_registered_sink() {
        let transport: WsTransport<TestSink> = WsTransport::default();
        let c = conn();
        let (tx, mut rx) = mpsc::unbounded();
        transport.register(c.id(), tx);

        transport.send(&c, r#"{"action":"pong"}"#).await.unwrap();

        match rx.next().await {
            Some(Message::Text(text)) => assert_eq!(text.as_str(), r#"{"action":"pong"}"#),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection_is_closed_error() {
        let transport: WsTransport<TestSink> = WsTransport::default();

        let err = transport.send(&conn(), "{}").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Transport(TransportErrorKind::Closed)
        );
    }

    #[tokio::test]
    async fn test_send_to_dropped_socket_is_send_error() {
        let transport: WsTransport<TestSink> = WsTransport::default();
        let c = conn();
        let (tx, rx) = mpsc::unbounded();
        transport.register(c.id(), tx);
        drop(rx);

        let err = transport.send(&c, "{}").await.unwrap_err();
        assert_eq!(err.error_kind, ErrorKind::Transport(TransportErrorKind::Send));
    }

    #[test]
    fn test_unregister_removes_sink() {
        let transport: WsTransport<TestSink> = WsTransport::default();
        let c = conn();
        let (tx, _rx) = mpsc::unbounded();
        transport.register(c.id(), tx);
        assert_eq!(transport.len(), 1);

        transport.unregister(&c.id());
        transport.unregister(&c.id());
        assert!(transport.is_empty());
    }
}
