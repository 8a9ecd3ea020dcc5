//! Internal publish hook for out-of-process mutation handlers.
//!
//! The CRUD backend calls this after it has persisted a change. The call is
//! fire-and-forget: the response does not say who received the event.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::PublishRequest;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, StreamError};

/// `POST /publish`: Publish an event to one topic.
///
/// # Errors
///
/// Returns [`StreamError`] if the topic or event name is blank.
#[utoipa::path(
    post,
    path = "/api/v1/publish",
    tag = "Events",
    summary = "Publish an event",
    description = "Delivers an event to the current subscribers of one topic. Best-effort: subscribers that cannot be written to are disconnected, and a topic without subscribers is not an error.",
    request_body = PublishRequest,
    responses(
        (status = 202, description = "Event accepted"),
        (status = 400, description = "Blank topic or event name", body = ErrorResponse),
    )
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> Result<impl IntoResponse, StreamError> {
    let topic = req.validate()?;
    state
        .publisher
        .publish(topic.as_str(), &req.event, req.payload);
    Ok(StatusCode::ACCEPTED)
}

/// Publish routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/publish", post(publish_event))
}
