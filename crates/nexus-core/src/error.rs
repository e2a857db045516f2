//! Error types for the NEXUS system.

use thiserror::Error;
use uuid::Uuid;

use crate::models::integration::IntegrationStatus;

#[derive(Debug, Error)]
pub enum NexusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Entity already exists: {entity}")]
    DuplicateConflict { entity: String },

    #[error("Upstream platform rejected the request: {platform}: {reason}")]
    UpstreamRejected { platform: String, reason: String },

    #[error("Integration is {actual}, expected {expected}")]
    WrongState {
        expected: IntegrationStatus,
        actual: IntegrationStatus,
    },

    #[error("Integration {integration_id} saved, but processing not triggered: {reason}")]
    DispatchFailed {
        integration_id: Uuid,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type NexusResult<T> = Result<T, NexusError>;
