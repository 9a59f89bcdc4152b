//! Axum router configuration with middleware.
//!
//! All WebSocket routes are under `/api/v1/ws/`.
//! Middleware: CORS, tracing.

use axum::routing::get;
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws_routes = Router::new()
        .route("/ws/conversation", get(handlers::conversation::conversation_ws))
        .route("/ws/emotion", get(handlers::emotion::emotion_ws))
        .route("/ws/animation", get(handlers::animation::animation_ws));

    Router::new()
        .nest("/api/v1", ws_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint; unauthenticated by design.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(json!({ "status": "ok" }))
}
