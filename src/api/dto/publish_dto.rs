//! DTOs for the internal publish hook.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TopicId;
use crate::error::StreamError;

/// Request body for `POST /api/v1/publish`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublishRequest {
    /// Target topic: a display id or `"global"`.
    pub topic: String,
    /// Event name written to the `event:` field.
    pub event: String,
    /// JSON payload written to the `data:` field. Defaults to `null`.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

impl PublishRequest {
    /// Validates the request and returns the parsed topic.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidTopic`] for a blank topic and
    /// [`StreamError::InvalidRequest`] for a blank event name.
    pub fn validate(&self) -> Result<TopicId, StreamError> {
        let topic = TopicId::parse(&self.topic)?;
        if self.event.trim().is_empty() {
            return Err(StreamError::InvalidRequest(
                "event name must not be empty".to_string(),
            ));
        }
        Ok(topic)
    }
}
