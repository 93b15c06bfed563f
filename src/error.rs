//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Command gate faults
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Store failures
    #[error(transparent)]
    Store(#[from] StoreError),

    // Server errors (5xx)
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Stable, machine-readable code for the error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::InvalidApiKey => "invalid_api_key",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Domain(DomainError::NotFound { .. }) => "not_found",
            AppError::Domain(DomainError::ForbiddenAccess) => "forbidden_access",
            AppError::Domain(DomainError::ApplicationConstraint(_)) => "application_constraint",
            AppError::Domain(DomainError::Validation(_)) => "validation_error",
            AppError::Store(e) if e.is_conflict() => "save_conflict",
            AppError::Store(StoreError::Cancelled) => "cancelled",
            AppError::Store(_) => "save_failed",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidApiKey | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Domain(domain_err) => match domain_err {
                DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
                DomainError::ForbiddenAccess => StatusCode::FORBIDDEN,
                DomainError::ApplicationConstraint(_) => StatusCode::CONFLICT,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            },
            AppError::Store(e) if e.is_conflict() => StatusCode::CONFLICT,
            AppError::Store(StoreError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Internal(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, details) = match &self {
            AppError::InvalidRequest(msg) | AppError::Unauthorized(msg) => {
                (self.to_string(), Some(msg.clone()))
            }
            AppError::Domain(DomainError::ApplicationConstraint(msg))
            | AppError::Domain(DomainError::Validation(msg)) => {
                (self.to_string(), Some(msg.clone()))
            }
            AppError::Store(StoreError::Conflict(msg)) => {
                tracing::warn!("Save conflict: {}", msg);
                ("Save conflict".to_string(), None)
            }
            AppError::Store(StoreError::Cancelled) => (self.to_string(), None),
            // Store internals stay in the logs
            AppError::Store(e) => {
                tracing::error!("Save failed: {:?}", e);
                ("Save failed".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal error".to_string(), None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                ("Configuration error".to_string(), None)
            }
            _ => (self.to_string(), None),
        };

        let body = ErrorResponse {
            error,
            error_code: self.error_code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
