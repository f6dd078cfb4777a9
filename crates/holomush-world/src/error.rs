//! Error types for world access.

use thiserror::Error;

/// Errors returned by world services.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The requested entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The subject is not authorized for the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The operation ran past its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The entity failed domain validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl WorldError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        WorldError::NotFound(entity.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorldError::NotFound(_))
    }
}

/// Result type for world operations.
pub type WorldResult<T> = std::result::Result<T, WorldError>;
