//! Error types for the Dashboard API.
//!
//! Every callable operation fails with one of these codes. Callers of
//! `updateTransferStatus` rely on `not-found`, `permission-denied` and
//! `failed-precondition` staying distinct.
//!
//! ```text
//! ┌──────────────────────┬────────┬──────────────────────────────────────┐
//! │ code                 │ status │ raised for                           │
//! ├──────────────────────┼────────┼──────────────────────────────────────┤
//! │ unauthenticated      │ 401    │ no / bad bearer token                │
//! │ invalid-argument     │ 400    │ malformed body, validation failures  │
//! │ not-found            │ 404    │ missing transfer, vehicle, user, ... │
//! │ permission-denied    │ 403    │ wrong role or dealership             │
//! │ failed-precondition  │ 409    │ already processed, wrong vehicle     │
//! │                      │        │ status, lost write race              │
//! │ internal             │ 500    │ storage failures                     │
//! └──────────────────────┴────────┴──────────────────────────────────────┘
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use dealernet_core::{CoreError, ValidationError};
use dealernet_db::DbError;

/// Dashboard API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required: {0}")]
    Unauthenticated(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidArgument(_) => "invalid-argument",
            ApiError::NotFound(_) => "not-found",
            ApiError::PermissionDenied(_) => "permission-denied",
            ApiError::FailedPrecondition(_) => "failed-precondition",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::FailedPrecondition(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthenticated(msg)
            | ApiError::InvalidArgument(msg)
            | ApiError::NotFound(msg)
            | ApiError::PermissionDenied(msg)
            | ApiError::FailedPrecondition(msg) => msg.clone(),
            // Storage details stay in the logs
            ApiError::Internal(_) => "Internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(detail = %detail, "Request failed");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let msg = err.to_string();
        match err {
            CoreError::Validation(_) => ApiError::InvalidArgument(msg),
            CoreError::VehicleNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::DealershipNotFound(_)
            | CoreError::TransferNotFound(_) => ApiError::NotFound(msg),
            CoreError::NotAuthorized { .. } => ApiError::PermissionDenied(msg),
            CoreError::TransferAlreadyProcessed { .. } | CoreError::InvalidVehicleStatus { .. } => {
                ApiError::FailedPrecondition(msg)
            }
            CoreError::Export(_) => ApiError::Internal(msg),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::InvalidArgument(err.to_string()),
            DbError::Conflict { .. } => ApiError::FailedPrecondition(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument(rejection.body_text())
    }
}
