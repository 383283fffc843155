//! Feedback read handlers: listing, lookup, metrics and trend.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use parley_types::feedback::{Feedback, FeedbackMetrics, SatisfactionTrendPoint};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::{FeedbackListQuery, TrendQuery};
use crate::http::response::{ApiResponse, Page};
use crate::state::AppState;

/// GET /api/v1/feedback - Newest first, filtered and paginated.
pub async fn list_feedback(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<FeedbackListQuery>,
) -> Result<Json<ApiResponse<Page<Feedback>>>, AppError> {
    let start = Instant::now();
    let pagination = query.pagination();

    let (items, total) = state.feedback_service.list(&query.to_filter()?).await?;
    let page = Page {
        items,
        total,
        page: pagination.page(),
        limit: pagination.limit(),
    };

    Ok(Json(
        ApiResponse::timed(page, start)
            .with_link("self", "/api/v1/feedback")
            .with_link("metrics", "/api/v1/feedback/metrics"),
    ))
}

/// GET /api/v1/feedback/:id
pub async fn get_feedback(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Feedback>>, AppError> {
    let start = Instant::now();

    let id: Uuid = id
        .parse()
        .map_err(|_| AppError::Validation(format!("'{id}' is not a valid feedback id")))?;
    let feedback = state.feedback_service.get(&id).await?;
    let user_link = format!("/api/v1/users/{}", feedback.user_id);

    Ok(Json(ApiResponse::timed(feedback, start).with_link("user", &user_link)))
}

/// GET /api/v1/feedback/metrics
pub async fn get_metrics(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<FeedbackMetrics>>, AppError> {
    let start = Instant::now();
    let metrics = state.feedback_service.metrics().await?;
    Ok(Json(ApiResponse::timed(metrics, start)))
}

/// GET /api/v1/feedback/trend?days=30
pub async fn get_trend(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<TrendQuery>,
) -> Result<Json<ApiResponse<Vec<SatisfactionTrendPoint>>>, AppError> {
    let start = Instant::now();
    let trend = state.feedback_service.trend(query.days).await?;
    Ok(Json(ApiResponse::timed(trend, start)))
}
