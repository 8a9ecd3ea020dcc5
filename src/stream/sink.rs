//! Channel-backed transport for SSE responses.
//!
//! [`ChannelSink`] is the write half handed to a [`Connection`]; the read
//! half becomes the response body through [`EventStream`]. The stream owns
//! a guard that disconnects the connection when axum drops the body, which
//! is how a client abort reaches the cleanup path.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::response::sse;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::domain::event::HEARTBEAT_COMMENT;
use crate::domain::{Connection, DisconnectReason, Frame, FrameSink, StreamHub};
use crate::error::SinkError;

/// Default number of frames buffered per connection.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

/// Non-blocking sink over a bounded channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Option<mpsc::Sender<Frame>>,
}

/// Creates a sink and the receiver that feeds the response body.
///
/// A `capacity` of zero is raised to one.
#[must_use]
pub fn channel(capacity: usize) -> (ChannelSink, mpsc::Receiver<Frame>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelSink { tx: Some(tx) }, rx)
}

impl FrameSink for ChannelSink {
    fn send(&mut self, frame: Frame) -> Result<(), SinkError> {
        let Some(tx) = &self.tx else {
            return Err(SinkError::Closed);
        };
        tx.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn close(&mut self) {
        // Dropping the sender ends the body once buffered frames are drained.
        self.tx = None;
    }
}

impl From<Frame> for sse::Event {
    fn from(frame: Frame) -> Self {
        if matches!(frame, Frame::Heartbeat) {
            return Self::default().comment(HEARTBEAT_COMMENT);
        }
        let mut event = Self::default();
        if let Some(name) = frame.event_name() {
            event = event.event(name);
        }
        if let Some(data) = frame.data() {
            event = event.data(data);
        }
        event
    }
}

#[derive(Debug)]
struct DisconnectOnDrop {
    hub: Arc<StreamHub>,
    connection: Arc<Connection>,
}

impl Drop for DisconnectOnDrop {
    fn drop(&mut self) {
        self.hub
            .disconnect(&self.connection, DisconnectReason::ClientAbort);
    }
}

/// SSE body stream for one connection.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Frame>,
    _guard: DisconnectOnDrop,
}

impl EventStream {
    /// Wraps `rx`; dropping the stream disconnects `connection` from `hub`.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Frame>, hub: Arc<StreamHub>, connection: Arc<Connection>) -> Self {
        Self {
            rx,
            _guard: DisconnectOnDrop { hub, connection },
        }
    }
}

impl Stream for EventStream {
    type Item = Result<sse::Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx
            .poll_recv(cx)
            .map(|frame| frame.map(|frame| Ok(frame.into())))
    }
}
