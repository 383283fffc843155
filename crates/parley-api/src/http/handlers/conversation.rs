//! Live conversation handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};

use parley_core::conversation::FeedbackRequestOutcome;
use parley_types::conversation::SessionSummary;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/conversations - Sessions currently held in memory.
pub async fn list_conversations(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, AppError> {
    let start = Instant::now();
    Ok(Json(ApiResponse::timed(state.engine.sessions(), start)))
}

/// POST /api/v1/conversations/:user_key/feedback-request
///
/// Operator-initiated feedback prompt. An unanswered operator prompt closes
/// the session without recording feedback.
pub async fn request_feedback(
    State(state): State<AppState>,
    Authenticated(key_id): Authenticated,
    Path(user_key): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    tracing::debug!(key_id = %key_id, user_key = %user_key, "operator feedback request");

    match state.engine.request_feedback(&user_key).await {
        FeedbackRequestOutcome::Sent => Ok(Json(ApiResponse::timed(
            serde_json::json!({ "prompted": true, "user_key": user_key }),
            start,
        ))),
        FeedbackRequestOutcome::AlreadyPrompted => Ok(Json(ApiResponse::timed(
            serde_json::json!({ "prompted": false, "reason": "already_prompted" }),
            start,
        ))),
        FeedbackRequestOutcome::NoSession => Err(AppError::NotFound(format!(
            "No active conversation for '{user_key}'"
        ))),
        FeedbackRequestOutcome::NotActive => Err(AppError::Validation(format!(
            "'{user_key}' is already giving feedback"
        ))),
    }
}
