//! crates/text_review_core/src/error.rs
//!
//! The error taxonomy surfaced by the core service operations.

use crate::ports::PortError;

/// Failures of a core operation, classified by what the caller should do about them.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A required field was missing or empty. Nothing was written.
    #[error("{0}")]
    Validation(String),

    /// The referenced text, contribution or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller is authenticated but neither the owner nor an admin.
    #[error("{0}")]
    Forbidden(String),

    /// The external correction service failed outright.
    #[error("AI correction failed: {0}")]
    UpstreamDependency(String),

    /// Storage or runtime failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => ServiceError::NotFound(what),
            PortError::Conflict(what) => ServiceError::Validation(what),
            PortError::Unexpected(detail) => ServiceError::Internal(detail),
            PortError::Unauthorized => ServiceError::Forbidden("Unauthorized".to_string()),
        }
    }
}
