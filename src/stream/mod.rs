//! Server-Sent Events layer: stream endpoints and the channel transport.
//!
//! Both endpoints accept `GET` only; axum answers other methods with
//! `405 Method Not Allowed`.

pub mod handler;
pub mod sink;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// Stream routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stream/display", get(handler::display_stream))
        .route("/stream/global", get(handler::global_stream))
}
