//! # Error Handling
//!
//! This module defines the HTTP-facing error type and how every domain error
//! in the crate is converted into it.
//!
//! ## Key Rust Concepts for Error Handling:
//!
//! ### Result<T, E> Type
//! - Handlers return `AppResult<T>`, so `?` works on any error that has a
//!   `From` conversion below
//!
//! ### Layered Errors
//! - **Domain errors** (`QuizError`, `AudioError`, `ServiceError`, `BankError`)
//!   are `thiserror` enums close to the code that raises them
//! - **AppError** decides the status code and the JSON shape clients see
//!
//! ## Response Body:
//! ```json
//! { "error": { "type": "not_found", "message": "...", "timestamp": "..." } }
//! ```

use crate::audio::AudioError;
use crate::quiz::{BankError, QuizError};
use crate::services::ServiceError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// ## Error Categories:
/// - **Internal / ConfigError**: server-side problems (500)
/// - **BadRequest / ValidationError / InvalidInput**: bad client data (400)
/// - **NotFound**: unknown quiz session or resource (404)
/// - **Conflict**: quiz action not valid in the session's current state (409)
/// - **NoQuestionsAvailable**: the dataset has nothing for a locale (422)
/// - **Upstream**: the speech or translation service failed (502)
/// - **ServiceUnavailable**: missing credentials or session capacity (503)
#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
    ConfigError(String),
    ValidationError(String),
    InvalidInput(String),
    NoQuestionsAvailable(String),
    Conflict(String),
    Upstream(String),
    ServiceUnavailable(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, &str) {
        match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.as_str()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.as_str()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.as_str()),
            AppError::ConfigError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.as_str()),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.as_str()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.as_str()),
            AppError::NoQuestionsAvailable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "no_questions_available",
                msg.as_str(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.as_str()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg.as_str()),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.as_str())
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NoQuestionsAvailable(msg) => write!(f, "No questions available: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream service error: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = self.parts();

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        let message = err.to_string();
        match err {
            QuizError::NoQuestionsAvailable { .. } => AppError::NoQuestionsAvailable(message),
            QuizError::UnknownSession(_) => AppError::NotFound(message),
            QuizError::Capacity { .. } => AppError::ServiceUnavailable(message),
            QuizError::InvalidTransition { .. }
            | QuizError::Finished
            | QuizError::StaleRound { .. } => AppError::Conflict(message),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::MissingCredentials { .. } => AppError::ServiceUnavailable(err.to_string()),
            ServiceError::Io(_) => AppError::Internal(err.to_string()),
            _ => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<AudioError> for AppError {
    fn from(err: AudioError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<BankError> for AppError {
    fn from(err: BankError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Convenient type alias for Results that use our custom error type.
pub type AppResult<T> = Result<T, AppError>;
