use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

// API Routes - REST API for programmatic access
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest(
        "/api",
        Router::new()
            // Natural language pipeline
            .route("/ask", post(handlers::api::ask))
            // Caller-written SQL, no model involved
            .route("/query", post(handlers::api::execute_query))
            // System status
            .route("/status", get(handlers::api::system_status)),
    )
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
