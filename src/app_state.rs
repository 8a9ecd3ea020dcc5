//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::domain::{HubSettings, StreamHub};
use crate::service::Publisher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection registry and in-process fan-out.
    pub hub: Arc<StreamHub>,
    /// Publish façade for mutation handlers.
    pub publisher: Publisher,
    /// Frames buffered per connection before it counts as stalled.
    pub stream_buffer: usize,
}

impl AppState {
    /// Builds a fresh hub and an in-memory publisher over it.
    #[must_use]
    pub fn new(settings: HubSettings, stream_buffer: usize) -> Self {
        let hub = Arc::new(StreamHub::new(settings));
        let publisher = Publisher::in_memory(Arc::clone(&hub));
        Self {
            hub,
            publisher,
            stream_buffer,
        }
    }

    /// Builds the state described by `config`.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.hub_settings(), config.stream_buffer_capacity)
    }
}
