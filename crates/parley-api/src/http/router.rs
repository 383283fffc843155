//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat gateway webhook
        .route("/inbound", post(handlers::inbound::receive_message))
        // Users
        .route(
            "/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route("/users/import", post(handlers::user::import_users))
        .route("/users/metrics", get(handlers::user::get_metrics))
        .route(
            "/users/phone-numbers",
            get(handlers::user::list_phone_numbers),
        )
        .route(
            "/users/by-phone/{phone}",
            get(handlers::user::get_user_by_phone),
        )
        .route(
            "/users/{id}",
            get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        // Feedback
        .route("/feedback", get(handlers::feedback::list_feedback))
        .route("/feedback/metrics", get(handlers::feedback::get_metrics))
        .route("/feedback/trend", get(handlers::feedback::get_trend))
        .route("/feedback/{id}", get(handlers::feedback::get_feedback))
        // Hot topics
        .route("/topics/bulk", post(handlers::topic::bulk_create_topics))
        .route("/topics/hot", get(handlers::topic::hot_topics))
        // Live conversations
        .route(
            "/conversations",
            get(handlers::conversation::list_conversations),
        )
        .route(
            "/conversations/{user_key}/feedback-request",
            post(handlers::conversation::request_feedback),
        )
        .route("/health", get(health_check));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
