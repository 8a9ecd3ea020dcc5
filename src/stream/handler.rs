//! Axum SSE handlers for the per-display and global streams.

use axum::extract::{Query, State};
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Sse};
use serde::Deserialize;
use utoipa::IntoParams;

use super::sink::{self, EventStream};
use crate::app_state::AppState;
use crate::domain::TopicId;
use crate::error::{ErrorResponse, StreamError};

/// Query parameters of the per-display stream.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DisplayStreamParams {
    /// Display whose events to receive.
    pub display_id: Option<String>,
}

/// `GET /api/v1/stream/display?display_id=...`: Stream events for one display.
///
/// # Errors
///
/// Returns [`StreamError::InvalidTopic`] if `display_id` is missing or
/// blank, or [`StreamError::CapacityExceeded`] if a connection cap is hit.
#[utoipa::path(
    get,
    path = "/api/v1/stream/display",
    tag = "Streams",
    summary = "Per-display event stream",
    description = "Opens a Server-Sent Events stream for one display. The first frame is a `connected` event; a `: heartbeat` comment follows every heartbeat interval.",
    params(DisplayStreamParams),
    responses(
        (status = 200, description = "Event stream", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Missing or blank display id", body = ErrorResponse),
        (status = 503, description = "Connection limit reached", body = ErrorResponse),
    )
)]
pub async fn display_stream(
    State(state): State<AppState>,
    Query(params): Query<DisplayStreamParams>,
) -> Result<impl IntoResponse, StreamError> {
    let display_id = params
        .display_id
        .ok_or_else(|| StreamError::InvalidTopic("display_id is required".to_string()))?;
    let topic = TopicId::parse(&display_id)?;
    open_stream(state, topic)
}

/// `GET /api/v1/stream/global`: Stream events published to the global topic.
///
/// # Errors
///
/// Returns [`StreamError::CapacityExceeded`] if a connection cap is hit.
#[utoipa::path(
    get,
    path = "/api/v1/stream/global",
    tag = "Streams",
    summary = "Global event stream",
    description = "Opens a Server-Sent Events stream on the `global` topic.",
    responses(
        (status = 200, description = "Event stream", body = String, content_type = "text/event-stream"),
        (status = 503, description = "Connection limit reached", body = ErrorResponse),
    )
)]
pub async fn global_stream(State(state): State<AppState>) -> Result<impl IntoResponse, StreamError> {
    open_stream(state, TopicId::global())
}

fn open_stream(state: AppState, topic: TopicId) -> Result<impl IntoResponse, StreamError> {
    let (sink, rx) = sink::channel(state.stream_buffer);
    let connection = state.hub.open(topic, sink)?;
    let stream = EventStream::new(rx, state.hub, connection);

    Ok((
        // Keeps reverse proxies from buffering the stream.
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(stream),
    ))
}
