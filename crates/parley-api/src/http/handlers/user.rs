//! User CRUD handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use parley_infra::user_csv;
use parley_types::user::{
    CreateUserRequest, ImportReport, UpdateUserRequest, UserId, UserMetrics, UserProfile,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::UserListQuery;
use crate::http::response::{ApiResponse, Page};
use crate::state::AppState;

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("'{raw}' is not a valid user id")))
}

/// POST /api/v1/users - Register a user.
pub async fn create_user(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), AppError> {
    let start = Instant::now();

    let user = state.user_service.create_user(body).await?;
    let self_link = format!("/api/v1/users/{}", user.id);
    let resp = ApiResponse::timed(user, start).with_link("self", &self_link);

    Ok((StatusCode::CREATED, Json(resp)))
}

/// GET /api/v1/users - List users with search and pagination.
pub async fn list_users(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Page<UserProfile>>>, AppError> {
    let start = Instant::now();
    let pagination = query.pagination();

    let (items, total) = state.user_service.list_users(&query.to_filter()).await?;
    let page = Page {
        items,
        total,
        page: pagination.page(),
        limit: pagination.limit(),
    };

    Ok(Json(ApiResponse::timed(page, start).with_link("self", "/api/v1/users")))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();

    let user = state.user_service.get_user(&parse_user_id(&id)?).await?;
    let self_link = format!("/api/v1/users/{}", user.id);

    Ok(Json(ApiResponse::timed(user, start).with_link("self", &self_link)))
}

/// GET /api/v1/users/by-phone/:phone - Accepts the number with or without `+`.
pub async fn get_user_by_phone(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(phone): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();

    let user = state.user_service.get_by_phone(&phone).await?;
    let self_link = format!("/api/v1/users/{}", user.id);

    Ok(Json(ApiResponse::timed(user, start).with_link("self", &self_link)))
}

/// PUT /api/v1/users/:id - Partial update.
pub async fn update_user(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserProfile>>, AppError> {
    let start = Instant::now();

    let user = state
        .user_service
        .update_user(&parse_user_id(&id)?, body)
        .await?;
    let self_link = format!("/api/v1/users/{}", user.id);

    Ok(Json(ApiResponse::timed(user, start).with_link("self", &self_link)))
}

/// DELETE /api/v1/users/:id - Remove a user and their feedback.
pub async fn delete_user(
    State(state): State<AppState>,
    _auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();

    let id = parse_user_id(&id)?;
    state.user_service.delete_user(&id).await?;

    Ok(Json(ApiResponse::timed(
        serde_json::json!({ "deleted": true, "id": id }),
        start,
    )))
}

/// POST /api/v1/users/import - Register users from a CSV body.
///
/// Rows that fail are listed in the report; the rest are imported.
pub async fn import_users(
    State(state): State<AppState>,
    _auth: Authenticated,
    body: Bytes,
) -> Result<Json<ApiResponse<ImportReport>>, AppError> {
    let start = Instant::now();

    let rows = user_csv::read_users(body.as_ref())?;
    let report = state.user_service.import_users(rows).await?;

    Ok(Json(
        ApiResponse::timed(report, start).with_link("users", "/api/v1/users"),
    ))
}

/// GET /api/v1/users/metrics
pub async fn get_metrics(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<UserMetrics>>, AppError> {
    let start = Instant::now();
    let metrics = state.user_service.metrics().await?;
    Ok(Json(ApiResponse::timed(metrics, start)))
}

/// GET /api/v1/users/phone-numbers - Every registered number, sorted.
pub async fn list_phone_numbers(
    State(state): State<AppState>,
    _auth: Authenticated,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let start = Instant::now();
    let phones = state.user_service.phone_numbers().await?;
    Ok(Json(ApiResponse::timed(phones, start)))
}
