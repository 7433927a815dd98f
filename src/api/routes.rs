//! API route definitions

use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Chat endpoints
        .route("/chat", post(handlers::chat))
        .route("/chat/search", get(handlers::search))
        .route("/chat/status", get(handlers::chat_status))
        // Administration
        .route("/admin/indexing/all", post(handlers::index_all))
        .route("/admin/indexing/status", get(handlers::indexing_status))
        .route("/admin/indexing/:category", post(handlers::index_category))
        .route("/admin/collections/:name", delete(handlers::clear_collection))
        .with_state(state)
}
