//! Admin API error type definitions

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::store::StoreError;

use super::types::AdminErrorResponse;
use super::validation::ValidationError;

/// Admin service error types
#[derive(Debug)]
pub enum AdminServiceError {
    /// Malformed or out-of-range request input
    Validation(ValidationError),

    /// Referenced entity does not exist (or is soft-deleted)
    NotFound { entity: &'static str, id: String },

    /// Operation would break a store credit invariant
    InvalidState(String),

    /// Missing or invalid admin credentials
    Unauthorized,

    /// Unexpected persistence failure
    InternalError(String),
}

impl fmt::Display for AdminServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminServiceError::Validation(e) => write!(f, "{}", e),
            AdminServiceError::NotFound { entity, id } => {
                write!(f, "{} with id {} was not found", entity, id)
            }
            AdminServiceError::InvalidState(msg) => write!(f, "{}", msg),
            AdminServiceError::Unauthorized => write!(f, "Invalid or missing admin API key"),
            AdminServiceError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AdminServiceError {}

impl AdminServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        AdminServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Get corresponding HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            AdminServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdminServiceError::InvalidState(_) => StatusCode::CONFLICT,
            AdminServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdminServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert to API error envelope
    ///
    /// Internal error details stay in the logs.
    pub fn to_envelope(&self) -> AdminErrorResponse {
        match self {
            AdminServiceError::Validation(_) => AdminErrorResponse::invalid_data(self.to_string()),
            AdminServiceError::NotFound { .. } => AdminErrorResponse::not_found(self.to_string()),
            AdminServiceError::InvalidState(_) => {
                AdminErrorResponse::not_allowed(self.to_string())
            }
            AdminServiceError::Unauthorized => AdminErrorResponse::unauthorized(),
            AdminServiceError::InternalError(_) => AdminErrorResponse::unexpected_state(),
        }
    }
}

impl IntoResponse for AdminServiceError {
    fn into_response(self) -> Response {
        if let AdminServiceError::InternalError(msg) = &self {
            tracing::error!("Admin request failed: {}", msg);
        }
        (self.status_code(), Json(self.to_envelope())).into_response()
    }
}

impl From<ValidationError> for AdminServiceError {
    fn from(err: ValidationError) -> Self {
        AdminServiceError::Validation(err)
    }
}

impl From<StoreError> for AdminServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => AdminServiceError::not_found("StoreCredit", id),
            StoreError::Conflict(msg) => AdminServiceError::InvalidState(msg),
            StoreError::Persistence(e) => AdminServiceError::InternalError(format!("{:#}", e)),
        }
    }
}
