//! API request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::error;
use tracing::info;

use crate::api::types::*;
use crate::indexing::Indexer;
use crate::models::Category;
use crate::models::ClearAck;
use crate::models::IndexingResult;
use crate::models::IndexingSummary;
use crate::rag::pipeline::ALL_COLLECTIONS;
use crate::rag::RagService;
use crate::vector_store::VectorStore;
use crate::TutorRag;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rag: Arc<RagService>,
    pub indexer: Arc<Indexer>,
    pub store: Arc<VectorStore>,
}

impl From<&TutorRag> for AppState {
    fn from(app: &TutorRag) -> Self {
        Self {
            rag: Arc::clone(&app.rag),
            indexer: Arc::clone(&app.indexer),
            store: Arc::clone(&app.store),
        }
    }
}

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn failure(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (status, Json(ApiResponse::error(message)))
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Grounded chat; always answers 200, with an apology on internal failure
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    info!("POST /api/chat");

    let answer = state
        .rag
        .chat(
            &request.prompt,
            request.collection_name.as_deref(),
            request.top_k,
        )
        .await;

    Json(ChatResponse {
        status: "success".to_string(),
        prompt: request.prompt,
        response: answer.response,
        collection_used: answer.collection_used,
        top_k: answer.top_k,
    })
}

/// Similarity search without generation
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, HandlerError> {
    info!(
        "GET /api/chat/search?query={}&top_k={:?}",
        params.query, params.top_k
    );

    let results = state
        .rag
        .search(
            &params.query,
            params.collection_name.as_deref(),
            params.top_k,
            params.threshold,
        )
        .await
        .map_err(|e| {
            error!("Search failed: {}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(SearchResponse {
        status: "success".to_string(),
        query: params.query,
        total_found: results.len(),
        results,
        collection_searched: params
            .collection_name
            .unwrap_or_else(|| ALL_COLLECTIONS.to_string()),
    }))
}

/// Per-category collection availability and size
pub async fn chat_status(State(state): State<AppState>) -> Json<ChatStatusResponse> {
    let mut collections = BTreeMap::new();
    for category in Category::ALL {
        let name = category.collection_name();
        let status = match state.store.collection_info(name).await {
            Ok(info) => CollectionStatus {
                document_count: info.count,
                status: "available".to_string(),
            },
            Err(_) => CollectionStatus {
                document_count: 0,
                status: "not_available".to_string(),
            },
        };
        collections.insert(name.to_string(), status);
    }

    Json(ChatStatusResponse {
        status: "success".to_string(),
        chat_system: "active".to_string(),
        rag_system: "available".to_string(),
        collections,
    })
}

/// Index every category concurrently
pub async fn index_all(State(state): State<AppState>) -> Json<ApiResponse<IndexingSummary>> {
    info!("POST /api/admin/indexing/all");
    Json(ApiResponse::success(state.indexer.index_all().await))
}

/// Index one category, addressed by category or collection name
pub async fn index_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<IndexingResult>>, HandlerError> {
    info!("POST /api/admin/indexing/{}", category);

    let category: Category = category
        .parse()
        .map_err(|e: crate::TutorRagError| failure(StatusCode::NOT_FOUND, e.to_string()))?;
    Ok(Json(ApiResponse::success(
        state.indexer.index_category(category).await,
    )))
}

/// Remove every document from a collection
pub async fn clear_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<ClearAck>>, HandlerError> {
    info!("DELETE /api/admin/collections/{}", name);

    match state.indexer.clear_collection(&name).await {
        Ok(ack) => Ok(Json(ApiResponse::success(ack))),
        Err(e) if e.is_not_found() => Err(failure(StatusCode::NOT_FOUND, e.to_string())),
        Err(e) => {
            error!("Failed to clear {}: {}", name, e);
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Document counts of every registered collection
pub async fn indexing_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<IndexingStatusResponse>> {
    let collections = state.indexer.status().await;
    let total_documents = collections.iter().map(|c| c.count).sum();
    Json(ApiResponse::success(IndexingStatusResponse {
        collections,
        total_documents,
    }))
}
