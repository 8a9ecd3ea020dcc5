//! Service layer: the publish façade used by mutation handlers.
//!
//! [`Publisher`] wraps a [`crate::domain::FanOut`] and is the only call
//! business logic needs after a persisted state change.

pub mod publisher;

pub use publisher::Publisher;
