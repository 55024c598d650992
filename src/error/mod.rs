//! Error classification for the Baufi server
//!
//! Store-level failures are described by [`StoreError`] and classified into a
//! small [`ErrorKind`] taxonomy. [`ApiError`] maps that taxonomy onto HTTP
//! status codes and JSON error bodies for the request-handling layer.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::db::DbError;

/// A field-level rule violation. The message is shown to the client as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Classification of every failure the loan service can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input broke a field rule; nothing was written
    ValidationFailure,
    /// Entity addressed by id does not exist
    NotFound,
    /// Special-payment operation referenced a missing loan
    LoanNotFound,
    /// Opaque failure of the underlying engine
    StoreFailure,
}

/// Errors returned by the loan service
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("loan not found")]
    NotFound { loan_id: String },

    #[error("loan not found")]
    LoanNotFound { loan_id: String },

    #[error("special payment not found")]
    PaymentNotFound { loan_id: String, payment_id: String },

    #[error("{operation} failed for {entity_id}: {source}")]
    Database {
        operation: &'static str,
        entity_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{operation} failed for {entity_id}: {source}")]
    Checkpoint {
        operation: &'static str,
        entity_id: String,
        #[source]
        source: DbError,
    },
}

impl StoreError {
    /// Where this error falls in the taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::ValidationFailure,
            StoreError::NotFound { .. } | StoreError::PaymentNotFound { .. } => {
                ErrorKind::NotFound
            }
            StoreError::LoanNotFound { .. } => ErrorKind::LoanNotFound,
            StoreError::Database { .. } | StoreError::Checkpoint { .. } => {
                ErrorKind::StoreFailure
            }
        }
    }

    /// Attach the operation name and entity id to an engine error
    pub(crate) fn database(
        operation: &'static str,
        entity_id: impl Into<String>,
    ) -> impl FnOnce(sqlx::Error) -> StoreError {
        let entity_id = entity_id.into();
        move |source| StoreError::Database {
            operation,
            entity_id,
            source,
        }
    }
}

/// Result type alias for loan service operations
pub type StoreResult<T> = Result<T, StoreError>;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Internal details stay in the log
        let message = match &self {
            ApiError::InternalError(detail) | ApiError::DatabaseError(detail) => {
                tracing::error!(error = %detail, code = %error_code, "Server error occurred");
                "Internal server error".to_string()
            }
            _ => {
                let message = self.to_string();
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
                message
            }
        };

        let body = ErrorResponse {
            error: message,
            code: error_code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            ErrorKind::ValidationFailure => ApiError::ValidationError(err.to_string()),
            ErrorKind::NotFound | ErrorKind::LoanNotFound => ApiError::NotFound(err.to_string()),
            ErrorKind::StoreFailure => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::ValidationError(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        tracing::debug!(error = %err, "Rejected request body");
        ApiError::BadRequest("Invalid request body".to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
