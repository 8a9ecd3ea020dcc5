//! HTTP layer: route handlers, DTOs, and router composition.
//!
//! Streams and the publish hook are mounted under `/api/v1`; system
//! endpoints live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete router with all HTTP endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}
