//! Multi-collection similarity search

use std::sync::Arc;

use tracing::debug;

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::SearchResult;
use crate::vector_store::VectorStore;

/// Fans a query out over collections and merges the hits by distance
pub struct Retriever {
    embedding_service: Arc<EmbeddingService>,
    store: Arc<VectorStore>,
    default_collections: Vec<String>,
    threshold_multiplier: usize,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(
        embedding_service: Arc<EmbeddingService>,
        store: Arc<VectorStore>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedding_service,
            store,
            default_collections: config.default_collections.clone(),
            threshold_multiplier: config.threshold_multiplier.max(1),
        }
    }

    /// Ranked hits across `collections` (or the defaults), ascending by
    /// distance and at most `top_k` long. Unknown collections contribute
    /// nothing; equal distances keep scan order.
    pub async fn search(
        &self,
        query: &str,
        collections: Option<&[String]>,
        top_k: usize,
        similarity_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        debug!("Searching for {:?} (top_k={})", query, top_k);

        let query_embedding = self.embedding_service.embed_one(query).await?;

        let targets = collections.unwrap_or(&self.default_collections);
        let per_collection = if similarity_threshold.is_some() {
            top_k.saturating_mul(self.threshold_multiplier)
        } else {
            top_k
        };

        let mut results = Vec::new();
        for name in targets {
            let handle = match self.store.collection(name) {
                Ok(handle) => handle,
                Err(e) if e.is_not_found() => {
                    debug!("Skipping unknown collection {}", name);
                    continue;
                }
                Err(e) => return Err(e),
            };
            let hits = self
                .store
                .query(&handle, &query_embedding, per_collection)
                .await?;
            debug!("{} returned {} hits", name, hits.len());

            results.extend(hits.into_iter().map(|hit| SearchResult {
                id: hit.id,
                document_text: hit.document,
                metadata: hit.metadata,
                distance: hit.distance,
                source_collection: name.clone(),
            }));
        }

        if let Some(threshold) = similarity_threshold {
            results.retain(|r| r.similarity() >= threshold);
        }

        // stable: ties keep collection scan order
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(top_k);
        Ok(results)
    }

    #[must_use]
    pub fn default_collections(&self) -> &[String] {
        &self.default_collections
    }
}
