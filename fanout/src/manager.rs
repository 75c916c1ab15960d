use dashmap::DashMap;
use futures::FutureExt;
use log::*;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::action::{ActionHandler, ActionTable};
use crate::connection::{Connection, ConnectionId};
use crate::context::{Context, HOST_CONTEXT};
use crate::dispatch::DispatchQueue;
use crate::message::{self, Payload};
use crate::pattern::Pattern;
use crate::registry::{ContextRegistry, UnsubscribeMatching};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport-level connect seen, no message yet.
    Connected,
    /// At least one well-formed message received.
    Active,
    /// Closed, or never known.
    Disconnected,
}

/// Behavioural switches for the manager.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerOptions {
    pub unsubscribe_matching: UnsubscribeMatching,
    pub case_sensitive_actions: bool,
}

/// Reacts to connection lifecycle events and routes outbound messages.
///
/// The manager owns the context registry and the action table and feeds the
/// dispatch queue; the `Dispatcher` on the other end of that queue performs
/// the actual sends.
pub struct Manager {
    registry: Arc<ContextRegistry>,
    actions: ActionTable,
    queue: DispatchQueue,
    states: DashMap<ConnectionId, ConnectionState>,
}

impl Manager {
    pub fn new(queue: DispatchQueue) -> Self {
        Self::with_options(queue, ManagerOptions::default())
    }

    pub fn with_options(queue: DispatchQueue, options: ManagerOptions) -> Self {
        Self {
            registry: Arc::new(ContextRegistry::with_matching(
                options.unsubscribe_matching,
            )),
            actions: ActionTable::with_case_sensitivity(options.case_sensitive_actions),
            queue,
            states: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ContextRegistry> {
        &self.registry
    }

    pub fn state_of(&self, id: ConnectionId) -> ConnectionState {
        self.states
            .get(&id)
            .map(|state| *state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Registers a new connection and binds it to its remote host.
    pub fn on_connect(&self, connection: &Connection) {
        info!(
            "WebSocket connect from {}:{}",
            connection.host(),
            connection.port()
        );

        self.states
            .insert(connection.id(), ConnectionState::Connected);
        self.registry.track(connection);
        self.registry
            .subscribe(HOST_CONTEXT, &connection.host(), connection);
    }

    /// Purges every subscription held by the connection. Safe to call more
    /// than once.
    pub fn on_disconnect(&self, connection: &Connection, code: u16, reason: &str) {
        if self.states.remove(&connection.id()).is_none() {
            debug!(
                "Disconnect for {} which is not connected; purging anyway",
                connection.id()
            );
        } else {
            info!(
                "WebSocket disconnect from {}:{} (code {}, reason {:?})",
                connection.host(),
                connection.port(),
                code,
                reason
            );
        }

        self.registry.remove_connection(connection);
    }

    /// Decodes an inbound frame, runs its action handler and queues any
    /// response for the originating connection.
    ///
    /// Malformed frames, unknown actions and failing or panicking handlers are
    /// logged and dropped; none of them affect other connections.
    pub async fn on_message(&self, connection: &Connection, raw: &str) {
        debug!(
            "WebSocket message received from {}:{}: {:?}",
            connection.host(),
            connection.port(),
            raw
        );

        let inbound = match message::decode(raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(
                    "Dropping message from {}:{} ({}): {}",
                    connection.host(),
                    connection.port(),
                    e.kind_name(),
                    e
                );
                return;
            }
        };

        if let Some(mut state) = self.states.get_mut(&connection.id()) {
            if *state == ConnectionState::Connected {
                *state = ConnectionState::Active;
            }
        }

        let Some(handler) = self.actions.lookup(&inbound.action) else {
            warn!(
                "Dropping message from {}:{}: unknown action {:?}",
                connection.host(),
                connection.port(),
                inbound.action
            );
            return;
        };

        let outcome = AssertUnwindSafe(handler.on_message(connection, &inbound.payload))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Some(response))) => {
                self.send_to(connection, &response);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                error!(
                    "Action {:?} failed with {} caused by {}:{}: {}",
                    inbound.action,
                    e.kind_name(),
                    connection.host(),
                    connection.port(),
                    e
                );
            }
            Err(_) => {
                error!(
                    "Action {:?} panicked while handling a message from {}:{}",
                    inbound.action,
                    connection.host(),
                    connection.port()
                );
            }
        }
    }

    pub fn register_action(&self, name: &str, handler: Arc<dyn ActionHandler>) {
        self.actions.register(name, handler);
    }

    pub fn register_actions(&self, names: &[&str], handler: Arc<dyn ActionHandler>) -> usize {
        self.actions.register_all(names, handler)
    }

    /// Binds `connection` to (context, value). Refused, returning false, once
    /// the connection has disconnected or if it never connected.
    pub fn subscribe(&self, context: Context, value: &str, connection: &Connection) -> bool {
        self.registry.subscribe(context, value, connection)
    }

    pub fn unsubscribe(&self, context: Context, value: &str, connection: &Connection) -> usize {
        self.registry.unsubscribe(context, value, connection)
    }

    /// Queues `payload` for every connected client. Returns the number of
    /// entries queued.
    pub fn dispatch(&self, payload: &Payload) -> usize {
        let Some(frame) = Self::encode(payload) else {
            return 0;
        };
        let connections = self.registry.all_connections();

        debug!("Queueing message for broadcast to {} connection(s)", connections.len());
        self.queue.enqueue_all(connections, frame)
    }

    /// Queues `payload` for every connection subscribed under `context` to a
    /// value matching `pattern`. Returns the number of entries queued.
    pub fn dispatch_to(&self, context: Context, pattern: &str, payload: &Payload) -> usize {
        let Some(frame) = Self::encode(payload) else {
            return 0;
        };
        let members = self.registry.members_of(context, &Pattern::new(pattern));

        debug!(
            "Queueing message for {}={:?} to {} connection(s)",
            context,
            pattern,
            members.len()
        );
        self.queue.enqueue_all(members, frame)
    }

    /// Queues `payload` for a single connection.
    pub fn send_to(&self, connection: &Connection, payload: &Payload) -> bool {
        match Self::encode(payload) {
            Some(frame) => self.queue.enqueue(connection.clone(), frame),
            None => false,
        }
    }

    fn encode(payload: &Payload) -> Option<Arc<str>> {
        match message::encode(payload) {
            Ok(json) => Some(Arc::from(json)),
            Err(e) => {
                error!("Failed to serialize outgoing message: {e}");
                None
            }
        }
    }
}
