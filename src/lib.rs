//! # signage-events
//!
//! Real-time display-event distribution for a signage management system.
//!
//! Display clients and admin UIs hold long-lived Server-Sent Events
//! streams, one per topic (a display id, or `"global"`). Mutation handlers
//! call [`service::Publisher::publish`] after persisting a change, and the
//! event is written to every stream currently open on that topic.
//!
//! ## Architecture
//!
//! ```text
//! Clients (SSE, internal HTTP)
//!     │
//!     ├── Stream Handlers (stream/)
//!     ├── Publish Hook, System (api/)
//!     │
//!     ├── Publisher (service/)
//!     │
//!     ├── StreamHub (domain/) ── Heartbeat task per connection
//!     │
//!     └── TopicRegistry ── Connection ── FrameSink
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod stream;
