//! Hot-topic handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use parley_types::topic::{BulkCreateTopicsRequest, HotTopic};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/topics/bulk - Store a batch of topic reports.
pub async fn bulk_create_topics(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<BulkCreateTopicsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<serde_json::Value>>), AppError> {
    let start = Instant::now();

    let created = state.topic_service.bulk_create(&body).await?;
    let resp = ApiResponse::timed(serde_json::json!({ "created": created }), start)
        .with_link("hot", "/api/v1/topics/hot");

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/topics/hot - Top five titles of the last 30 days.
pub async fn hot_topics(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<HotTopic>>>, AppError> {
    let start = Instant::now();
    let topics = state.topic_service.hot_topics().await?;
    Ok(Json(
        ApiResponse::timed(topics, start).with_link("self", "/api/v1/topics/hot"),
    ))
}
