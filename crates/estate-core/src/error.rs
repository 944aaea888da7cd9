//! Domain errors

use thiserror::Error;

use crate::domain::{VerificationAction, VerificationState};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Identity service unavailable: {0}")]
    AuthUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Cannot {action} a property in state {from}")]
    InvalidTransition {
        from: VerificationState,
        action: VerificationAction,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DomainError::NotFound { entity, id: id.into() }
    }

    pub fn denied(msg: impl Into<String>) -> Self {
        DomainError::PermissionDenied(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::ValidationFailed(msg.into())
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DomainError::ValidationFailed(errors.to_string())
    }
}
