//! Data Transfer Objects for REST request/response serialization.

pub mod publish_dto;
pub mod stats_dto;

pub use publish_dto::*;
pub use stats_dto::*;
