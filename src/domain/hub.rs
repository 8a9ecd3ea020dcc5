//! Connection lifecycle coordinator and in-process fan-out.
//!
//! [`StreamHub`] is the single service object request handlers share. It
//! owns the [`TopicRegistry`] and is the only place connections are opened
//! and torn down:
//!
//! - **open**: create → register → handshake → start heartbeat
//! - **disconnect**: close (cancels heartbeat, closes sink) → unregister
//!
//! `disconnect` is reachable from a client abort, a failed publish write and
//! a failed heartbeat write. The connection's own state guard makes sure it
//! runs once no matter how many of those race.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::heartbeat::{self, DEFAULT_HEARTBEAT_INTERVAL};
use super::registry::ConnectionLimits;
use super::{
    Connection, DeliveryReport, Event, FanOut, FrameSink, TopicId, TopicRegistry, WriteOutcome,
};
use crate::error::StreamError;

/// Why a connection was torn down. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The client went away.
    ClientAbort,
    /// Writing the handshake failed.
    HandshakeFailed,
    /// Writing a published event failed.
    PublishFailed,
    /// Writing a heartbeat failed.
    HeartbeatFailed,
}

impl DisconnectReason {
    /// Returns the reason as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClientAbort => "client_abort",
            Self::HandshakeFailed => "handshake_failed",
            Self::PublishFailed => "publish_failed",
            Self::HeartbeatFailed => "heartbeat_failed",
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunables for a [`StreamHub`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubSettings {
    /// Interval between heartbeats on each connection.
    pub heartbeat_interval: Duration,
    /// Connection caps enforced at open time.
    pub limits: ConnectionLimits,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            limits: ConnectionLimits::UNLIMITED,
        }
    }
}

/// Opens, tracks and tears down server-push connections.
#[derive(Debug)]
pub struct StreamHub {
    registry: Arc<TopicRegistry>,
    settings: HubSettings,
}

impl StreamHub {
    /// Creates a hub with an empty registry.
    #[must_use]
    pub fn new(settings: HubSettings) -> Self {
        Self {
            registry: Arc::new(TopicRegistry::new()),
            settings,
        }
    }

    /// Returns the hub's registry.
    #[must_use]
    pub const fn registry(&self) -> &Arc<TopicRegistry> {
        &self.registry
    }

    /// Returns the hub's settings.
    #[must_use]
    pub const fn settings(&self) -> &HubSettings {
        &self.settings
    }

    /// Opens a connection on `topic` writing to `sink`.
    ///
    /// Must be called from within a tokio runtime (the heartbeat task is
    /// spawned here).
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::CapacityExceeded`] if a connection cap is
    /// reached (nothing is registered), or [`StreamError::Internal`] if the
    /// handshake could not be written (the connection is already cleaned up).
    pub fn open(
        self: &Arc<Self>,
        topic: TopicId,
        sink: impl FrameSink + 'static,
    ) -> Result<Arc<Connection>, StreamError> {
        let connection = Arc::new(Connection::new(topic, sink));
        self.registry
            .try_register(Arc::clone(&connection), self.settings.limits)
            .inspect_err(|err| {
                tracing::warn!(topic = %connection.topic(), error = %err, "stream rejected");
            })?;

        if let Err(err) = connection.open() {
            self.disconnect(&connection, DisconnectReason::HandshakeFailed);
            return Err(StreamError::Internal(format!("handshake failed: {err}")));
        }

        let handle = heartbeat::spawn(
            Arc::clone(self),
            Arc::clone(&connection),
            self.settings.heartbeat_interval,
        );
        connection.attach_heartbeat(handle);

        tracing::info!(
            topic = %connection.topic(),
            connection_id = %connection.id(),
            subscribers = self.registry.subscriber_count(connection.topic().as_str()),
            "stream opened"
        );
        Ok(connection)
    }

    /// Tears a connection down: closes it, then unregisters it.
    ///
    /// Returns `true` only for the call that actually performed cleanup.
    pub fn disconnect(&self, connection: &Connection, reason: DisconnectReason) -> bool {
        if !connection.close() {
            return false;
        }
        self.registry.unregister(connection.topic(), connection.id());
        tracing::info!(
            topic = %connection.topic(),
            connection_id = %connection.id(),
            %reason,
            "stream closed"
        );
        true
    }

    /// Writes `event` to every current subscriber of its topic.
    ///
    /// Subscribers whose write fails are disconnected; delivery to the
    /// rest continues.
    pub fn deliver(&self, event: &Event) -> DeliveryReport {
        let subscribers = self.registry.snapshot(event.target_topic.as_str());
        let mut report = DeliveryReport::default();
        if subscribers.is_empty() {
            return report;
        }

        let frame = event.to_frame();
        for connection in &subscribers {
            match connection.send(frame.clone()) {
                Ok(WriteOutcome::Written) => {
                    report.delivered = report.delivered.saturating_add(1);
                }
                Ok(WriteOutcome::Skipped) => {}
                Err(err) => {
                    tracing::debug!(
                        topic = %event.target_topic,
                        connection_id = %connection.id(),
                        error = %err,
                        "event write failed"
                    );
                    self.disconnect(connection, DisconnectReason::PublishFailed);
                    report.dropped = report.dropped.saturating_add(1);
                }
            }
        }
        report
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new(HubSettings::default())
    }
}

impl FanOut for StreamHub {
    fn fan_out(&self, event: &Event) -> DeliveryReport {
        self.deliver(event)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::testing::RecordingSink;
    use crate::domain::{ConnectionState, Frame};
    use crate::error::SinkError;

    fn hub() -> Arc<StreamHub> {
        Arc::new(StreamHub::default())
    }

    fn open(hub: &Arc<StreamHub>, topic: &str) -> (Arc<Connection>, RecordingSink) {
        let sink = RecordingSink::default();
        let Ok(conn) = hub.open(TopicId::new_unchecked(topic), sink.clone()) else {
            panic!("open failed");
        };
        (conn, sink)
    }

    fn event(topic: &str, name: &str, payload: serde_json::Value) -> Event {
        Event::new(TopicId::new_unchecked(topic), name, payload)
    }

    #[tokio::test]
    async fn open_registers_and_handshakes() {
        let hub = hub();
        let (conn, sink) = open(&hub, "display-42");

        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(hub.registry().subscriber_count("display-42"), 1);
        assert!(matches!(sink.frames().first(), Some(Frame::Handshake { .. })));
    }

    #[tokio::test]
    async fn failed_handshake_leaves_nothing_registered() {
        let hub = hub();
        let sink = RecordingSink::default();
        sink.fail_with(SinkError::Closed);

        let result = hub.open(TopicId::new_unchecked("display-42"), sink.clone());
        assert!(matches!(result, Err(StreamError::Internal(_))));
        assert!(!hub.registry().contains_topic("display-42"));
        assert_eq!(sink.close_calls(), 1);
    }

    #[tokio::test]
    async fn open_beyond_cap_is_rejected_before_handshake() {
        let hub = Arc::new(StreamHub::new(HubSettings {
            limits: ConnectionLimits {
                per_topic: 1,
                total: 0,
            },
            ..HubSettings::default()
        }));
        let _first = open(&hub, "display-1");

        let sink = RecordingSink::default();
        let result = hub.open(TopicId::new_unchecked("display-1"), sink.clone());
        assert!(matches!(result, Err(StreamError::CapacityExceeded(_))));
        assert_eq!(sink.attempts(), 0);
        assert_eq!(hub.registry().subscriber_count("display-1"), 1);
    }

    #[tokio::test]
    async fn scenario_single_subscriber_receives_event() {
        let hub = hub();
        let (_conn, sink) = open(&hub, "display-42");

        let report = hub.deliver(&event(
            "display-42",
            "display-updated",
            serde_json::json!({ "rev": 1 }),
        ));

        assert_eq!(report.delivered, 1);
        let events = sink.events();
        assert_eq!(events.len(), 1);
        let Some(frame) = events.first() else {
            panic!("expected one event frame");
        };
        assert_eq!(frame.event_name(), Some("display-updated"));
        assert_eq!(frame.data().as_deref(), Some(r#"{"rev":1}"#));
    }

    #[tokio::test]
    async fn scenario_no_cross_topic_fan_out() {
        let hub = hub();
        let (_c1, display) = open(&hub, "display-42");
        let (_c2, global) = open(&hub, TopicId::GLOBAL);

        hub.deliver(&event("display-42", "display-updated", serde_json::json!({})));

        assert_eq!(display.events().len(), 1);
        assert!(global.events().is_empty());
    }

    #[tokio::test]
    async fn scenario_abort_then_publish_writes_nothing() {
        let hub = hub();
        let (conn, sink) = open(&hub, "display-42");

        assert!(hub.disconnect(&conn, DisconnectReason::ClientAbort));
        assert!(!hub.registry().contains_topic("display-42"));

        let attempts = sink.attempts();
        let report = hub.deliver(&event("display-42", "display-updated", serde_json::json!({})));
        assert_eq!(report, DeliveryReport::default());
        assert_eq!(sink.attempts(), attempts);
    }

    #[tokio::test]
    async fn n_subscribers_get_identical_payloads() {
        let hub = hub();
        let sinks: Vec<_> = (0..5).map(|_| open(&hub, "display-9").1).collect();

        let report = hub.deliver(&event(
            "display-9",
            "playlist-changed",
            serde_json::json!({ "items": [1, 2, 3], "name": "lobby" }),
        ));
        assert_eq!(report.delivered, 5);
        assert_eq!(report.attempts(), 5);

        let payloads: Vec<_> = sinks
            .iter()
            .flat_map(RecordingSink::events)
            .filter_map(|f| f.data())
            .collect();
        assert_eq!(payloads.len(), 5);
        assert!(payloads.windows(2).all(|w| w.first() == w.last()));
    }

    #[tokio::test]
    async fn empty_topic_is_silent_noop() {
        let hub = hub();
        let report = hub.deliver(&event("display-404", "display-updated", serde_json::json!(1)));
        assert_eq!(report.attempts(), 0);
    }

    #[tokio::test]
    async fn failing_subscriber_is_removed_and_others_still_receive() {
        let hub = hub();
        let (bad, bad_sink) = open(&hub, "display-1");
        let (_good, good_sink) = open(&hub, "display-1");
        bad_sink.fail_with(SinkError::Full);

        let report = hub.deliver(&event("display-1", "a", serde_json::json!(1)));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert!(bad.is_closed());
        assert_eq!(hub.registry().subscriber_count("display-1"), 1);

        let attempts = bad_sink.attempts();
        let report = hub.deliver(&event("display-1", "b", serde_json::json!(2)));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 0);
        assert_eq!(bad_sink.attempts(), attempts);
        assert_eq!(good_sink.events().len(), 2);
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = hub();
        let (_conn, sink) = open(&hub, "display-1");
        for rev in 0..10 {
            hub.deliver(&event("display-1", "display-updated", serde_json::json!({ "rev": rev })));
        }
        let revs: Vec<_> = sink.events().iter().filter_map(Frame::data).collect();
        let expected: Vec<_> = (0..10).map(|rev| format!(r#"{{"rev":{rev}}}"#)).collect();
        assert_eq!(revs, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_disconnects_clean_up_once() {
        let hub = hub();
        let (conn, sink) = open(&hub, "display-1");

        let mut tasks = Vec::new();
        for reason in [
            DisconnectReason::ClientAbort,
            DisconnectReason::PublishFailed,
            DisconnectReason::HeartbeatFailed,
            DisconnectReason::ClientAbort,
        ] {
            let hub = Arc::clone(&hub);
            let conn = Arc::clone(&conn);
            tasks.push(tokio::spawn(async move { hub.disconnect(&conn, reason) }));
        }

        let mut performed = 0;
        for task in tasks {
            let Ok(did_cleanup) = task.await else {
                panic!("disconnect task panicked");
            };
            if did_cleanup {
                performed += 1;
            }
        }
        assert_eq!(performed, 1);
        assert_eq!(sink.close_calls(), 1);
        assert_eq!(hub.registry().connection_count(), 0);
    }

    #[test]
    fn reason_strings() {
        assert_eq!(DisconnectReason::ClientAbort.to_string(), "client_abort");
        assert_eq!(DisconnectReason::PublishFailed.as_str(), "publish_failed");
    }
}
