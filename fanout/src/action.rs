use async_trait::async_trait;
use dashmap::DashMap;
use log::*;
use std::sync::Arc;

use crate::connection::Connection;
use crate::error::Result;
use crate::message::Payload;

/// Outcome of an action handler: a response for the originating connection,
/// or nothing.
pub type HandlerResult = Result<Option<Payload>>;

/// Processes inbound messages carrying a given action name.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn on_message(&self, connection: &Connection, payload: &Payload) -> HandlerResult;
}

#[async_trait]
impl<F> ActionHandler for F
where
    F: Fn(&Connection, &Payload) -> HandlerResult + Send + Sync,
{
    async fn on_message(&self, connection: &Connection, payload: &Payload) -> HandlerResult {
        self(connection, payload)
    }
}

/// Maps action names to handlers. Populated at startup, read on every
/// inbound message.
pub struct ActionTable {
    handlers: DashMap<String, Arc<dyn ActionHandler>>,
    case_sensitive: bool,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::with_case_sensitivity(false)
    }

    pub fn with_case_sensitivity(case_sensitive: bool) -> Self {
        Self {
            handlers: DashMap::new(),
            case_sensitive,
        }
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Binds `handler` to `name`, replacing any earlier binding for that name.
    pub fn register(&self, name: &str, handler: Arc<dyn ActionHandler>) {
        if self.handlers.insert(self.key(name), handler).is_some() {
            warn!("Action \"{name}\" was already registered; replacing its handler");
        } else {
            debug!("Registered action \"{name}\"");
        }
    }

    /// Binds one handler under several action names, returning how many
    /// names were bound. An empty name list binds nothing and is logged.
    pub fn register_all(&self, names: &[&str], handler: Arc<dyn ActionHandler>) -> usize {
        if names.is_empty() {
            warn!("Ignoring action registration without any action name");
            return 0;
        }
        for name in names {
            self.register(name, Arc::clone(&handler));
        }
        names.len()
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers
            .get(&self.key(name))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}
