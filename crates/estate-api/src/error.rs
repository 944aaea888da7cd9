//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use estate_core::DomainError;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Identity service unavailable: {0}")]
    AuthUnavailable(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            ApiError::AuthUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "AUTH_UNAVAILABLE"),
            ApiError::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
            ApiError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::ValidationFailed(_) => ApiError::BadRequest(message),
            DomainError::PermissionDenied(_) => ApiError::Forbidden(message),
            DomainError::NotFound { .. } => ApiError::NotFound(message),
            DomainError::InvalidTransition { .. } => ApiError::Conflict(message),
            DomainError::AuthUnavailable(_) => ApiError::AuthUnavailable(message),
            DomainError::StoreUnavailable(_) => ApiError::StoreUnavailable(message),
            DomainError::Timeout(_) => ApiError::Timeout(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        } else {
            tracing::warn!(code, "{}", self);
        }
        let body = Json(ApiResponse::error(code, self.to_string()));
        (status, body).into_response()
    }
}
