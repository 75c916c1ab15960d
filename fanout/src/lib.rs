//! Real-time fan-out engine for long-lived client connections.
//!
//! This crate routes JSON messages to clients that subscribed to named,
//! value-scoped contexts ("all clients from host X", "all clients bound to
//! user Y"), and answers inbound client messages through registered actions.
//!
//! # Architecture
//!
//! - **Dual-index registry**: `ContextRegistry` keeps connection → context →
//!   values and context → value → connections in lock-step under one mutex.
//! - **Pattern scopes**: scoped dispatch and bulk unsubscribe select values
//!   with case-insensitive `*`/`?` globs.
//! - **Single writer**: every outbound frame goes through one unbounded FIFO
//!   and is written by one `Dispatcher` task, so producers never wait on the
//!   network and frames never interleave.
//! - **Best-effort delivery**: a failed send is logged and dropped.
//!
//! # Message Flow
//!
//! 1. Transport accepts a socket and calls `Manager::on_connect`; the
//!    connection is subscribed to `HOST_CONTEXT` with its remote host.
//! 2. Each text frame goes to `Manager::on_message`, which decodes it, looks
//!    up the handler for its `action` and queues the handler's response.
//! 3. Business logic calls `Manager::dispatch` / `Manager::dispatch_to`.
//! 4. The `Dispatcher` drains the queue and calls `Transport::send`.
//! 5. On close the transport calls `Manager::on_disconnect`, which purges the
//!    connection from every context.
//!
//! # Example: wiring the core
//!
//! ```rust,ignore
//! let (queue, receiver) = fanout::dispatch::channel();
//! let manager = Arc::new(fanout::Manager::new(queue));
//! let shutdown = CancellationToken::new();
//! Dispatcher::new(receiver, transport, shutdown.clone()).spawn();
//!
//! manager.dispatch_to(Context::User, "user-42", &with_action("refresh"));
//! ```
//!
//! # Modules
//!
//! - `pattern`: glob matching
//! - `context`: subscription dimensions
//! - `registry`: the bidirectional subscription index
//! - `action`: action handlers and the action table
//! - `dispatch`: dispatch queue and dispatcher
//! - `manager`: connection lifecycle and dispatch entry points
//! - `message`: payload codec
//! - `connection`: connection handles and the transport seam

pub mod action;
pub mod connection;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod manager;
pub mod message;
pub mod pattern;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use connection::{Connection, ConnectionId, Transport};
pub use context::{Context, HOST_CONTEXT};
pub use dispatch::{DispatchQueue, Dispatcher};
pub use manager::{ConnectionState, Manager, ManagerOptions};
pub use registry::{ContextRegistry, UnsubscribeMatching};
