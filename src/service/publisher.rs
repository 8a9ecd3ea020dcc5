//! Publisher: the call surface mutation handlers use after a state change.

use std::sync::Arc;

use crate::domain::{Event, FanOut, StreamHub, TopicId};

/// Fire-and-forget event publisher.
///
/// Cheap to clone. `publish` never fails and never panics: transport
/// failures are handled inside the [`FanOut`] by disconnecting the
/// subscriber, and a topic with no subscribers is a silent no-op.
#[derive(Debug, Clone)]
pub struct Publisher {
    fan_out: Arc<dyn FanOut>,
}

impl Publisher {
    /// Creates a publisher over an arbitrary fan-out implementation.
    #[must_use]
    pub fn new(fan_out: Arc<dyn FanOut>) -> Self {
        Self { fan_out }
    }

    /// Creates a publisher that delivers to connections held by `hub`.
    #[must_use]
    pub fn in_memory(hub: Arc<StreamHub>) -> Self {
        Self { fan_out: hub }
    }

    /// Sends `event_name` with `payload` to every current subscriber of
    /// `topic_id`.
    ///
    /// `topic_id` must be non-empty; that is the caller's responsibility and
    /// is not checked here. Delivery to one topic's subscribers follows
    /// publish-call order.
    pub fn publish(&self, topic_id: &str, event_name: &str, payload: serde_json::Value) {
        let event = Event::new(TopicId::new_unchecked(topic_id), event_name, payload);
        let report = self.fan_out.fan_out(&event);
        tracing::debug!(
            topic = topic_id,
            event = event_name,
            delivered = report.delivered,
            dropped = report.dropped,
            "event published"
        );
    }
}
