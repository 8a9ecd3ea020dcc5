//! Pluggable event fan-out.
//!
//! [`crate::service::Publisher`] hands every event to a [`FanOut`]. The
//! in-process implementation is [`super::StreamHub`], which writes to the
//! connections held by this process. A broker-backed implementation can
//! forward events to other instances without changing the publish API.

use std::fmt;

use serde::Serialize;

use super::Event;

/// Outcome of delivering one event to one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    /// Connections the frame was written to.
    pub delivered: usize,
    /// Connections whose write failed and that were disconnected.
    pub dropped: usize,
}

impl DeliveryReport {
    /// Total write attempts.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.delivered.saturating_add(self.dropped)
    }
}

/// Delivers an event to the current subscribers of its target topic.
///
/// Implementations are best-effort and must never panic on transport
/// failures.
pub trait FanOut: Send + Sync + fmt::Debug {
    /// Fans `event` out to `event.target_topic`.
    fn fan_out(&self, event: &Event) -> DeliveryReport;
}
