//! API request and response types

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::models::CollectionInfo;
use crate::models::SearchResult;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Chat request; only `prompt` is required
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub status: String,
    pub prompt: String,
    pub response: String,
    pub collection_used: String,
    pub top_k: usize,
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub threshold: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_found: usize,
    pub collection_searched: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionStatus {
    pub document_count: usize,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatStatusResponse {
    pub status: String,
    pub chat_system: String,
    pub rag_system: String,
    pub collections: BTreeMap<String, CollectionStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexingStatusResponse {
    pub collections: Vec<CollectionInfo>,
    pub total_documents: usize,
}
