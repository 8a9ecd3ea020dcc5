//! DTOs for the subscriber statistics endpoint.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::TopicRegistry;

/// Subscriber count of one topic.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TopicStatsDto {
    /// Topic id.
    pub topic: String,
    /// Open streams on this topic.
    pub subscribers: usize,
}

/// Response body for `GET /stats`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Open streams across all topics.
    pub connections: usize,
    /// Topics with at least one open stream, sorted by id.
    pub topics: Vec<TopicStatsDto>,
}

impl From<&TopicRegistry> for StatsResponse {
    fn from(registry: &TopicRegistry) -> Self {
        let topics: Vec<_> = registry
            .topics()
            .into_iter()
            .map(|(topic, subscribers)| TopicStatsDto {
                topic: topic.to_string(),
                subscribers,
            })
            .collect();
        Self {
            connections: topics.iter().map(|t| t.subscribers).sum(),
            topics,
        }
    }
}
