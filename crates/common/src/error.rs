//! Error types for evote-rs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Contestant not found: {0}")]
    ContestantNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Payment reference is required")]
    MissingReference,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("A vote for contestant {contestant_id} was already cast from this address")]
    DuplicateVote {
        /// Contestant the duplicate vote targeted.
        contestant_id: i64,
    },

    #[error("Payment {reference} not completed (status: {status})")]
    PaymentNotCompleted {
        /// Processor reference of the transaction.
        reference: String,
        /// Status reported by the processor.
        status: String,
    },

    // === Upstream Errors ===
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_)
            | Self::EventNotFound(_)
            | Self::ContestantNotFound(_)
            | Self::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::UnsupportedProvider(_)
            | Self::MissingReference => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::DuplicateVote { .. } => StatusCode::CONFLICT,
            Self::PaymentNotCompleted { .. } => StatusCode::PAYMENT_REQUIRED,

            // 5xx Upstream Errors
            Self::GatewayUnavailable(_) | Self::VerificationFailed(_) => StatusCode::BAD_GATEWAY,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::EventNotFound(_) => "EVENT_NOT_FOUND",
            Self::ContestantNotFound(_) => "CONTESTANT_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            Self::MissingReference => "MISSING_REFERENCE",
            Self::Conflict(_) => "CONFLICT",
            Self::DuplicateVote { .. } => "DUPLICATE_VOTE",
            Self::PaymentNotCompleted { .. } => "PAYMENT_NOT_COMPLETED",
            Self::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            Self::VerificationFailed(_) => "VERIFICATION_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
