//! Validated topic identifier.
//!
//! [`TopicId`] is a newtype wrapper around the string that partitions
//! subscribers: a display id, or the distinguished [`TopicId::GLOBAL`].
//! `"global"` is an ordinary topic by convention; publishing to it reaches
//! only the connections registered under it.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Identifier of a subscriber partition.
///
/// Cheap to clone (backed by `Arc<str>`). Used as the key in
/// [`super::TopicRegistry`] and as the routing target of every event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(Arc<str>);

impl TopicId {
    /// Topic id of the global stream.
    pub const GLOBAL: &'static str = "global";

    /// Parses a topic id supplied by a client.
    ///
    /// The id is kept verbatim so it matches the id later passed to
    /// `publish`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidTopic`] if the id is empty or only
    /// whitespace.
    pub fn parse(raw: &str) -> Result<Self, StreamError> {
        if raw.trim().is_empty() {
            return Err(StreamError::InvalidTopic(
                "topic id must not be empty".to_string(),
            ));
        }
        Ok(Self(Arc::from(raw)))
    }

    /// Returns the topic id of the global stream.
    #[must_use]
    pub fn global() -> Self {
        Self(Arc::from(Self::GLOBAL))
    }

    /// Wraps a topic id without validation.
    ///
    /// Used on the publish path, where a non-empty id is the caller's
    /// responsibility.
    #[must_use]
    pub fn new_unchecked(raw: &str) -> Self {
        Self(Arc::from(raw))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the global topic.
    #[must_use]
    pub fn is_global(&self) -> bool {
        &*self.0 == Self::GLOBAL
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TopicId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
