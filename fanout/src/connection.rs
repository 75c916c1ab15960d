use async_trait::async_trait;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

use crate::error::Result;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-owning handle to a live client channel.
///
/// The transport layer owns the socket itself; the core only ever holds this
/// handle. Two handles are the same connection iff their ids are equal.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    remote: SocketAddr,
}

impl Connection {
    pub fn new(remote: SocketAddr) -> Self {
        Self::with_id(ConnectionId::new(), remote)
    }

    pub fn with_id(id: ConnectionId, remote: SocketAddr) -> Self {
        Self { id, remote }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    /// Remote host string, the value the host context is keyed by.
    /// IPv4-mapped IPv6 peers from a dual-stack listener render as plain IPv4.
    pub fn host(&self) -> String {
        self.remote.ip().to_canonical().to_string()
    }

    pub fn port(&self) -> u16 {
        self.remote.port()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Connection {}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.remote)
    }
}

/// Outbound side of the wire, implemented by the boundary layer.
///
/// `send` completes once the frame has been handed to the socket. Failures are
/// reported as errors and never panic across this boundary.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, connection: &Connection, frame: &str) -> Result<()>;
}
