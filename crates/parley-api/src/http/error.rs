//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_infra::user_csv::CsvImportError;
use parley_types::error::{FeedbackError, TopicError, UserError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    User(UserError),
    Feedback(FeedbackError),
    Topic(TopicError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<FeedbackError> for AppError {
    fn from(e: FeedbackError) -> Self {
        AppError::Feedback(e)
    }
}

impl From<TopicError> for AppError {
    fn from(e: TopicError) -> Self {
        AppError::Topic(e)
    }
}

impl From<CsvImportError> for AppError {
    fn from(e: CsvImportError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl AppError {
    /// HTTP status, machine-readable code and message for this error.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            AppError::User(UserError::PhoneConflict(phone)) => (
                StatusCode::CONFLICT,
                "PHONE_CONFLICT",
                format!("Phone number '{phone}' is already registered"),
            ),
            AppError::User(
                e @ (UserError::InvalidPhone(_)
                | UserError::InvalidName(_)
                | UserError::InvalidGender(_)),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::User(e) => (StatusCode::INTERNAL_SERVER_ERROR, "USER_ERROR", e.to_string()),
            AppError::Feedback(FeedbackError::NotFound) => (
                StatusCode::NOT_FOUND,
                "FEEDBACK_NOT_FOUND",
                "Feedback not found".to_string(),
            ),
            AppError::Feedback(
                e @ (FeedbackError::InvalidRating(_) | FeedbackError::CommentTooLong { .. }),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Feedback(e @ FeedbackError::AlreadyRecorded(_)) => {
                (StatusCode::CONFLICT, "FEEDBACK_CONFLICT", e.to_string())
            }
            AppError::Feedback(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FEEDBACK_ERROR", e.to_string())
            }
            AppError::Topic(
                e @ (TopicError::InvalidBatch(_) | TopicError::InvalidTopic { .. }),
            ) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Topic(e) => (StatusCode::INTERNAL_SERVER_ERROR, "TOPIC_ERROR", e.to_string()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
