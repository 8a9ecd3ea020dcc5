//! Topic → connections mapping.
//!
//! [`TopicRegistry`] files every open [`Connection`] under its topic. All
//! mutations take one coarse lock; readers get a [`TopicRegistry::snapshot`]
//! copy and write to connections only after the lock is released, so a
//! stalled subscriber never blocks bookkeeping or other topics.
//!
//! # Invariants
//!
//! - A topic with no connections is never kept: the entry is removed as
//!   soon as its last connection is unregistered.
//! - `connection_count()` always equals the sum of all per-topic counts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Connection, ConnectionId, TopicId};
use crate::error::StreamError;

/// Optional caps on open connections. `0` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Maximum connections under one topic.
    pub per_topic: usize,
    /// Maximum connections across all topics.
    pub total: usize,
}

impl ConnectionLimits {
    /// No caps.
    pub const UNLIMITED: Self = Self {
        per_topic: 0,
        total: 0,
    };
}

type Subscribers = HashMap<ConnectionId, Arc<Connection>>;

#[derive(Debug, Default)]
struct Inner {
    topics: HashMap<TopicId, Subscribers>,
    connections: usize,
}

/// Central store of open connections keyed by topic.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    inner: Mutex<Inner>,
}

impl TopicRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Files `connection` under its own topic, creating the entry if absent.
    ///
    /// Returns `false` if this connection was already registered.
    pub fn register(&self, connection: Arc<Connection>) -> bool {
        let mut inner = self.lock();
        Self::insert(&mut inner, connection)
    }

    /// Like [`TopicRegistry::register`], but enforces `limits` atomically
    /// with the insert.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CapacityExceeded`] if the topic or the whole
    /// registry is at its cap. The registry is left unchanged.
    pub fn try_register(
        &self,
        connection: Arc<Connection>,
        limits: ConnectionLimits,
    ) -> Result<(), StreamError> {
        let mut inner = self.lock();
        if limits.total > 0 && inner.connections >= limits.total {
            return Err(StreamError::CapacityExceeded(format!(
                "{} open connections",
                inner.connections
            )));
        }
        let on_topic = inner
            .topics
            .get(connection.topic())
            .map_or(0, HashMap::len);
        if limits.per_topic > 0 && on_topic >= limits.per_topic {
            return Err(StreamError::CapacityExceeded(format!(
                "{on_topic} open connections on topic {}",
                connection.topic()
            )));
        }
        Self::insert(&mut inner, connection);
        Ok(())
    }

    /// Removes a connection, dropping the topic entry when it becomes empty.
    ///
    /// Returns `false` (and does nothing) if the connection was not present.
    pub fn unregister(&self, topic: &TopicId, id: ConnectionId) -> bool {
        let mut inner = self.lock();
        let Some(subscribers) = inner.topics.get_mut(topic) else {
            return false;
        };
        if subscribers.remove(&id).is_none() {
            return false;
        }
        if subscribers.is_empty() {
            inner.topics.remove(topic);
        }
        inner.connections = inner.connections.saturating_sub(1);
        true
    }

    /// Returns a fixed copy of the topic's current subscribers.
    #[must_use]
    pub fn snapshot(&self, topic: &str) -> Vec<Arc<Connection>> {
        self.lock()
            .topics
            .get(topic)
            .map(|subscribers| subscribers.values().map(Arc::clone).collect())
            .unwrap_or_default()
    }

    /// Number of connections registered under `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().topics.get(topic).map_or(0, HashMap::len)
    }

    /// Returns `true` if `topic` has at least one connection.
    #[must_use]
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.lock().topics.contains_key(topic)
    }

    /// Number of topics with at least one connection.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.lock().topics.len()
    }

    /// Total number of registered connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.lock().connections
    }

    /// Per-topic subscriber counts, sorted by topic id.
    #[must_use]
    pub fn topics(&self) -> Vec<(TopicId, usize)> {
        let mut topics: Vec<_> = self
            .lock()
            .topics
            .iter()
            .map(|(topic, subscribers)| (topic.clone(), subscribers.len()))
            .collect();
        topics.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        topics
    }

    fn insert(inner: &mut Inner, connection: Arc<Connection>) -> bool {
        let added = inner
            .topics
            .entry(connection.topic().clone())
            .or_default()
            .insert(connection.id(), connection)
            .is_none();
        if added {
            inner.connections = inner.connections.saturating_add(1);
        }
        added
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
