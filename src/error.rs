//! Service-level error taxonomy and its HTTP mapping.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::progress::ProgressError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// The event has not been opened for play yet.
    #[error("event `{0}` has not started")]
    EventNotStarted(String),
    /// A matching answer was already recorded for this pair.
    #[error("question already answered")]
    AlreadyAnswered,
    /// The progress row is terminal; no further tips or answers.
    #[error("question already completed")]
    AlreadyCompleted,
    /// All three attempt slots are spent.
    #[error("maximum number of attempts reached")]
    MaxAttemptsReached,
    /// Tip number outside 1..=3 or skipping ahead of the next tip.
    #[error("invalid tip number {requested} (revealed so far: {revealed})")]
    InvalidTipNumber {
        /// The level the caller asked for.
        requested: u8,
        /// The highest level revealed before the call.
        revealed: u8,
    },
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Concurrent writers kept invalidating the update.
    #[error("conflicting concurrent updates: {0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ProgressError> for ServiceError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::AlreadyCompleted => ServiceError::AlreadyCompleted,
            ProgressError::AlreadyAnswered => ServiceError::AlreadyAnswered,
            ProgressError::MaxAttemptsReached => ServiceError::MaxAttemptsReached,
            ProgressError::InvalidTipNumber {
                requested,
                revealed,
            } => ServiceError::InvalidTipNumber {
                requested,
                revealed,
            },
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            err @ (ServiceError::EventNotStarted(_)
            | ServiceError::AlreadyAnswered
            | ServiceError::AlreadyCompleted
            | ServiceError::MaxAttemptsReached) => AppError::Conflict(err.to_string()),
            err @ (ServiceError::InvalidTipNumber { .. } | ServiceError::InvalidInput(_)) => {
                AppError::BadRequest(err.to_string())
            }
            ServiceError::Conflict(message) => AppError::Conflict(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
