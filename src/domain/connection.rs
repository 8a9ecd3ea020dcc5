//! Connection lifecycle state machine.
//!
//! A [`Connection`] is one open server-push stream bound to a topic. Its
//! state, sink, and heartbeat handle live behind a single lock: every write
//! checks the state and writes under that lock, so frames are never
//! interleaved and nothing is written once the connection is `Closed`.
//!
//! ```text
//! Connecting ──open()──▶ Open ──close()──▶ Closed
//!      └──────────────close()───────────────▶┘
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;

use super::{Frame, TopicId};
use crate::error::SinkError;

/// Write half of a connection's transport.
///
/// Implementations must not block: a client that cannot accept a frame
/// right now is reported as [`SinkError::Full`].
pub trait FrameSink: Send + fmt::Debug {
    /// Writes one frame.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if the frame cannot be delivered.
    fn send(&mut self, frame: Frame) -> Result<(), SinkError>;

    /// Closes the transport. Must be safe to call more than once.
    fn close(&mut self);
}

/// Opaque connection identity (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId`.
    #[must_use]
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
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Created and possibly registered, handshake not yet written.
    Connecting,
    /// Handshake written; events and heartbeats are delivered.
    Open,
    /// Terminal.
    Closed,
}

/// Result of a write attempt that did not fail at the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The frame was handed to the sink.
    Written,
    /// The connection is not `Open`; nothing was written.
    Skipped,
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    sink: Box<dyn FrameSink>,
    last_heartbeat: DateTime<Utc>,
    heartbeat: Option<AbortHandle>,
}

/// One server-push stream bound to a single topic.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    topic: TopicId,
    opened_at: DateTime<Utc>,
    inner: Mutex<Inner>,
}

impl Connection {
    /// Creates a connection in the `Connecting` state.
    #[must_use]
    pub fn new(topic: TopicId, sink: impl FrameSink + 'static) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            topic,
            opened_at: now,
            inner: Mutex::new(Inner {
                state: ConnectionState::Connecting,
                sink: Box::new(sink),
                last_heartbeat: now,
                heartbeat: None,
            }),
        }
    }

    /// Returns the connection identity.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the topic this connection is filed under.
    #[must_use]
    pub const fn topic(&self) -> &TopicId {
        &self.topic
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Returns `true` once the connection reached `Closed`.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state() == ConnectionState::Closed
    }

    /// Returns the time of the last successful heartbeat (or of creation).
    #[must_use]
    pub fn last_heartbeat(&self) -> DateTime<Utc> {
        self.lock().last_heartbeat
    }

    /// Writes the handshake frame and moves `Connecting → Open`.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Closed`] if the connection is no longer
    /// `Connecting`, or the sink error if the handshake write failed. The
    /// connection stays out of `Open` in both cases; the caller runs cleanup.
    pub fn open(&self) -> Result<(), SinkError> {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Connecting {
            return Err(SinkError::Closed);
        }
        inner.sink.send(Frame::handshake(self.topic.clone()))?;
        inner.state = ConnectionState::Open;
        Ok(())
    }

    /// Writes a frame if the connection is `Open`.
    ///
    /// # Errors
    ///
    /// Returns the sink error on transport failure. The connection is not
    /// closed here; the caller runs cleanup.
    pub fn send(&self, frame: Frame) -> Result<WriteOutcome, SinkError> {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Open {
            return Ok(WriteOutcome::Skipped);
        }
        inner.sink.send(frame)?;
        Ok(WriteOutcome::Written)
    }

    /// Writes a heartbeat comment and records its time.
    ///
    /// # Errors
    ///
    /// Returns the sink error on transport failure.
    pub fn heartbeat(&self) -> Result<WriteOutcome, SinkError> {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Open {
            return Ok(WriteOutcome::Skipped);
        }
        inner.sink.send(Frame::Heartbeat)?;
        inner.last_heartbeat = Utc::now();
        Ok(WriteOutcome::Written)
    }

    /// Stores the heartbeat task handle so [`Connection::close`] can cancel it.
    ///
    /// If the connection already closed, the task is cancelled immediately.
    pub fn attach_heartbeat(&self, handle: AbortHandle) {
        let mut inner = self.lock();
        if inner.state == ConnectionState::Closed {
            handle.abort();
            return;
        }
        if let Some(previous) = inner.heartbeat.replace(handle) {
            previous.abort();
        }
    }

    /// Moves to `Closed`, cancels the heartbeat task, and closes the sink.
    ///
    /// Returns `true` only for the call that performed the transition;
    /// every later call is a no-op returning `false`.
    pub fn close(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == ConnectionState::Closed {
            return false;
        }
        inner.state = ConnectionState::Closed;
        if let Some(handle) = inner.heartbeat.take() {
            handle.abort();
        }
        inner.sink.close();
        true
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
