//! Inbound webhook for the chat gateway.
//!
//! Accepts one chat message per request, verifies the shared gateway token,
//! and hands the message to the conversation engine on a background task.
//! The gateway gets `202 Accepted` before any reply is produced.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use parley_types::conversation::InboundMessage;

use crate::http::error::AppError;
use crate::http::extractors::auth::verify_gateway_token;
use crate::state::AppState;

/// POST /api/v1/inbound
pub async fn receive_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(message): Json<InboundMessage>,
) -> Result<StatusCode, AppError> {
    verify_gateway_token(&headers, state.gateway_token.as_deref())?;

    tracing::debug!(from = %message.from, from_me = message.from_me, "inbound message");

    let engine = Arc::clone(&state.engine);
    tokio::spawn(async move {
        let outcome = engine.handle_message(&message).await;
        tracing::debug!(from = %message.from, ?outcome, "inbound message handled");
    });

    Ok(StatusCode::ACCEPTED)
}
