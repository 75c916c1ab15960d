use log::*;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::connection::Connection;
use crate::context::Context;
use crate::pattern::Pattern;

/// How `unsubscribe` interprets its value argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsubscribeMatching {
    /// The value is a pattern; every subscribed value it matches is retracted.
    #[default]
    Pattern,
    /// Only the identical value is retracted.
    Exact,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnsubscribeMatchingParseError;

impl FromStr for UnsubscribeMatching {
    type Err = UnsubscribeMatchingParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pattern" => Ok(UnsubscribeMatching::Pattern),
            "exact" => Ok(UnsubscribeMatching::Exact),
            _ => Err(UnsubscribeMatchingParseError),
        }
    }
}

impl fmt::Display for UnsubscribeMatching {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnsubscribeMatching::Pattern => write!(f, "pattern"),
            UnsubscribeMatching::Exact => write!(f, "exact"),
        }
    }
}

/// Both views of the subscription set. Only ever touched while holding the
/// registry lock, so the two maps are never observed out of step.
#[derive(Debug, Default)]
struct Indices {
    /// connection -> context -> subscribed values
    by_connection: HashMap<Connection, HashMap<Context, HashSet<String>>>,
    /// context -> value -> subscribed connections
    by_context: HashMap<Context, HashMap<String, HashSet<Connection>>>,
    /// connections between `track` and `remove_connection`; only these may
    /// gain subscriptions
    live: HashSet<Connection>,
}

impl Indices {
    /// Drops `connection` from the reverse entry for (context, value), pruning
    /// any container left empty.
    fn detach(&mut self, context: Context, value: &str, connection: &Connection) {
        if let Some(values) = self.by_context.get_mut(&context) {
            if let Some(connections) = values.get_mut(value) {
                connections.remove(connection);
                if connections.is_empty() {
                    values.remove(value);
                }
            }
            if values.is_empty() {
                self.by_context.remove(&context);
            }
        }
    }
}

/// Bidirectional subscription index shared by the lifecycle handler, the
/// dispatch path and business logic.
///
/// Every operation runs under a single lock covering both indices, and results
/// handed back to callers are copies, so no network I/O ever happens while the
/// lock is held.
#[derive(Debug, Default)]
pub struct ContextRegistry {
    indices: Mutex<Indices>,
    matching: UnsubscribeMatching,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matching(matching: UnsubscribeMatching) -> Self {
        Self {
            indices: Mutex::new(Indices::default()),
            matching,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Indices> {
        // nothing panics between the forward and reverse updates
        self.indices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `connection` as live so it can be subscribed. Returns false if it
    /// was already tracked.
    pub fn track(&self, connection: &Connection) -> bool {
        self.lock().live.insert(connection.clone())
    }

    pub fn is_live(&self, connection: &Connection) -> bool {
        self.lock().live.contains(connection)
    }

    /// Subscribes `connection` to (context, value). Returns false if the
    /// subscription already existed or the connection is not live.
    pub fn subscribe(&self, context: Context, value: &str, connection: &Connection) -> bool {
        let mut indices = self.lock();

        if !indices.live.contains(connection) {
            debug!(
                "Refusing to subscribe {} to {}={:?}: connection is not live",
                connection.id(),
                context,
                value
            );
            return false;
        }

        let added = indices
            .by_connection
            .entry(connection.clone())
            .or_default()
            .entry(context)
            .or_default()
            .insert(value.to_string());

        indices
            .by_context
            .entry(context)
            .or_default()
            .entry(value.to_string())
            .or_default()
            .insert(connection.clone());

        if added {
            debug!("Subscribed {} to {}={:?}", connection.id(), context, value);
        }
        added
    }

    /// Retracts subscriptions of `connection` under `context` selected by
    /// `value`, returning how many were removed.
    ///
    /// With pattern matching, one call may retract several values, e.g. `"room-*"`
    /// drops both `"room-1"` and `"room-2"`.
    pub fn unsubscribe(&self, context: Context, value: &str, connection: &Connection) -> usize {
        let mut indices = self.lock();

        let Some(contexts) = indices.by_connection.get_mut(connection) else {
            trace!("Unsubscribe for unknown connection {}", connection.id());
            return 0;
        };
        let Some(values) = contexts.get_mut(&context) else {
            return 0;
        };

        let targets: Vec<String> = match self.matching {
            UnsubscribeMatching::Exact => values.take(value).into_iter().collect(),
            UnsubscribeMatching::Pattern => {
                let pattern = Pattern::new(value);
                let matched: Vec<String> = values
                    .iter()
                    .filter(|candidate| pattern.matches(candidate))
                    .cloned()
                    .collect();
                for target in &matched {
                    values.remove(target);
                }
                matched
            }
        };

        if values.is_empty() {
            contexts.remove(&context);
        }
        if contexts.is_empty() {
            indices.by_connection.remove(connection);
        }

        for target in &targets {
            indices.detach(context, target, connection);
        }

        if !targets.is_empty() {
            debug!(
                "Unsubscribed {} from {}={:?} ({} value(s))",
                connection.id(),
                context,
                value,
                targets.len()
            );
        }
        targets.len()
    }

    /// Removes every subscription held by `connection` and stops tracking it,
    /// returning how many subscriptions were removed. A connection with no
    /// subscriptions is a no-op. Later `subscribe` calls for it are refused
    /// until it is tracked again.
    pub fn remove_connection(&self, connection: &Connection) -> usize {
        let mut indices = self.lock();
        indices.live.remove(connection);

        let Some(contexts) = indices.by_connection.remove(connection) else {
            debug!("No subscriptions to purge for {}", connection.id());
            return 0;
        };

        let mut removed = 0;
        for (context, values) in contexts {
            for value in values {
                indices.detach(context, &value, connection);
                removed += 1;
            }
        }

        debug!("Purged {} subscription(s) for {}", removed, connection.id());
        removed
    }

    /// Every connection subscribed under `context` to a value matching
    /// `pattern`. A connection matched through several values appears once.
    pub fn members_of(&self, context: Context, pattern: &Pattern) -> HashSet<Connection> {
        let indices = self.lock();

        let Some(values) = indices.by_context.get(&context) else {
            return HashSet::new();
        };

        values
            .iter()
            .filter(|(value, _)| pattern.matches(value))
            .flat_map(|(_, connections)| connections.iter().cloned())
            .collect()
    }

    /// Snapshot of every connection currently subscribed to anything.
    pub fn all_connections(&self) -> Vec<Connection> {
        self.lock().by_connection.keys().cloned().collect()
    }

    /// Snapshot of the subscriptions held by `connection`.
    pub fn contexts_of(&self, connection: &Connection) -> HashMap<Context, HashSet<String>> {
        self.lock()
            .by_connection
            .get(connection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        let indices = self.lock();
        indices.by_connection.is_empty() && indices.by_context.is_empty()
    }

    /// Asserts that the two indices mirror each other and hold no empty
    /// containers.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let indices = self.lock();

        for (connection, contexts) in &indices.by_connection {
            assert!(indices.live.contains(connection), "{connection} subscribed but not live");
            assert!(!contexts.is_empty(), "empty context map for {connection}");
            for (context, values) in contexts {
                assert!(!values.is_empty(), "empty value set for {connection}/{context}");
                for value in values {
                    let mirrored = indices
                        .by_context
                        .get(context)
                        .and_then(|v| v.get(value))
                        .is_some_and(|c| c.contains(connection));
                    assert!(mirrored, "{connection}/{context}/{value} missing from reverse index");
                }
            }
        }

        for (context, values) in &indices.by_context {
            assert!(!values.is_empty(), "empty value map for {context}");
            for (value, connections) in values {
                assert!(!connections.is_empty(), "empty connection set for {context}/{value}");
                for connection in connections {
                    let mirrored = indices
                        .by_connection
                        .get(connection)
                        .and_then(|c| c.get(context))
                        .is_some_and(|v| v.contains(value));
                    assert!(mirrored, "{connection}/{context}/{value} missing from forward index");
                }
            }
        }
    }
}
