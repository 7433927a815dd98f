//! HTTP server implementation

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::Result;
use crate::TutorRag;

/// Full application router: API under `/api` plus middleware
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    app
}

/// Start the API server
pub async fn serve_api(app: &TutorRag, host: &str, port: u16, enable_cors: bool) -> Result<()> {
    info!("Starting tutorrag API server...");

    for result in app.auto_index().await {
        info!(
            "Startup indexing {}: {:?} ({})",
            result.collection, result.status, result.message
        );
    }

    if enable_cors {
        info!("CORS enabled");
    }
    let router = build_router(AppState::from(app), enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET    /api/health                      - Health check");
    info!("  POST   /api/chat                        - Grounded chat");
    info!("  GET    /api/chat/search                 - Similarity search");
    info!("  GET    /api/chat/status                 - Collection availability");
    info!("  POST   /api/admin/indexing/all          - Index every category");
    info!("  POST   /api/admin/indexing/:category    - Index one category");
    info!("  GET    /api/admin/indexing/status       - Document counts");
    info!("  DELETE /api/admin/collections/:name     - Clear a collection");

    axum::serve(listener, router).await?;

    Ok(())
}
