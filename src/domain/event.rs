//! Display events and the frames written to a connection.
//!
//! An [`Event`] exists only for the duration of a publish call. It is
//! turned into a single [`Frame::Event`] whose serialized payload is shared
//! by every subscriber of the target topic, so all of them receive
//! byte-identical data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TopicId;

/// Event name of the handshake frame sent when a stream opens.
pub const HANDSHAKE_EVENT: &str = "connected";

/// Comment text of the keep-alive frame.
pub const HEARTBEAT_COMMENT: &str = "heartbeat";

/// A state change to announce to one topic's subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Application event name (e.g. `"display-updated"`).
    pub event_name: String,
    /// Arbitrary JSON payload.
    pub payload: serde_json::Value,
    /// Topic whose subscribers receive the event.
    pub target_topic: TopicId,
}

impl Event {
    /// Creates a new event for `target_topic`.
    #[must_use]
    pub fn new(
        target_topic: TopicId,
        event_name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            payload,
            target_topic,
        }
    }

    /// Builds the wire frame for this event, serializing the payload once.
    ///
    /// Line breaks are stripped from the event name; an `event:` field
    /// cannot span lines.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        let name: String = self
            .event_name
            .chars()
            .filter(|c| *c != '\n' && *c != '\r')
            .collect();
        Frame::Event {
            name: Arc::from(name),
            data: Arc::from(self.payload.to_string()),
        }
    }
}

/// One unit written to a connection's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// First frame of every stream: announces the topic and server time.
    Handshake {
        /// Topic the stream is bound to.
        topic: TopicId,
        /// Time the connection was opened.
        timestamp: DateTime<Utc>,
    },
    /// Application event with a pre-serialized JSON payload.
    Event {
        /// Event name written to the `event:` field.
        name: Arc<str>,
        /// Serialized JSON written to the `data:` field.
        data: Arc<str>,
    },
    /// Keep-alive comment. Never surfaced as an application event.
    Heartbeat,
}

impl Frame {
    /// Creates the handshake frame for `topic`, stamped with the current time.
    #[must_use]
    pub fn handshake(topic: TopicId) -> Self {
        Self::Handshake {
            topic,
            timestamp: Utc::now(),
        }
    }

    /// Returns the application event name carried by this frame, if any.
    ///
    /// Heartbeats have none.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::Handshake { .. } => Some(HANDSHAKE_EVENT),
            Self::Event { name, .. } => Some(name),
            Self::Heartbeat => None,
        }
    }

    /// Returns the `data:` field content, if any.
    #[must_use]
    pub fn data(&self) -> Option<String> {
        match self {
            Self::Handshake { topic, timestamp } => Some(
                serde_json::json!({
                    "topic": topic,
                    "timestamp": timestamp.to_rfc3339(),
                })
                .to_string(),
            ),
            Self::Event { data, .. } => Some(data.to_string()),
            Self::Heartbeat => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn event_frame_serializes_payload_compactly() {
        let event = Event::new(
            TopicId::new_unchecked("display-42"),
            "display-updated",
            serde_json::json!({ "rev": 1 }),
        );
        let frame = event.to_frame();
        assert_eq!(frame.event_name(), Some("display-updated"));
        assert_eq!(frame.data().as_deref(), Some(r#"{"rev":1}"#));
    }

    #[test]
    fn event_name_line_breaks_are_stripped() {
        let event = Event::new(
            TopicId::global(),
            "display\r\n-deleted",
            serde_json::Value::Null,
        );
        assert_eq!(event.to_frame().event_name(), Some("display-deleted"));
    }

    #[test]
    fn heartbeat_has_no_event_name_or_data() {
        assert_eq!(Frame::Heartbeat.event_name(), None);
        assert_eq!(Frame::Heartbeat.data(), None);
    }

    #[test]
    fn handshake_carries_topic_and_timestamp() {
        let frame = Frame::handshake(TopicId::new_unchecked("display-3"));
        assert_eq!(frame.event_name(), Some(HANDSHAKE_EVENT));
        let Some(data) = frame.data() else {
            panic!("handshake must carry data");
        };
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&data) else {
            panic!("handshake data must be JSON");
        };
        assert_eq!(
            value.get("topic").and_then(|v| v.as_str()),
            Some("display-3")
        );
        assert!(value.get("timestamp").is_some_and(|v| v.is_string()));
    }

    #[test]
    fn frames_from_one_event_share_payload_bytes() {
        let event = Event::new(TopicId::global(), "x", serde_json::json!([1, 2, 3]));
        assert_eq!(event.to_frame(), event.to_frame());
    }
}
