//! Domain layer: topics, connections, the registry, and event fan-out.
//!
//! This module contains the distribution core: topic identity, the
//! per-connection state machine, the topic registry, the per-connection
//! heartbeat scheduler, and the [`StreamHub`] that ties them together and
//! delivers events in-process.

pub mod connection;
pub mod event;
pub mod fan_out;
pub mod heartbeat;
pub mod hub;
pub mod registry;
pub mod topic_id;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, ConnectionId, ConnectionState, FrameSink, WriteOutcome};
pub use event::{Event, Frame};
pub use fan_out::{DeliveryReport, FanOut};
pub use hub::{DisconnectReason, HubSettings, StreamHub};
pub use registry::{ConnectionLimits, TopicRegistry};
pub use topic_id::TopicId;
