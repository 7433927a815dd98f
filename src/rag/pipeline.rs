//! Complete RAG pipeline: Retrieve -> Assemble -> Generate

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::config::RetrievalConfig;
use crate::errors::Result;
use crate::models::SearchResult;
use crate::rag::composer::AnswerComposer;
use crate::rag::prompts::build_apology;
use crate::rag::ContextAssembler;
use crate::rag::Retriever;

/// Label used when a request searches every default collection
pub const ALL_COLLECTIONS: &str = "all";

/// `None` and `"all"` both mean the configured default collections
fn scoped_targets(collection: Option<&str>) -> Option<Vec<String>> {
    collection
        .filter(|c| !c.eq_ignore_ascii_case(ALL_COLLECTIONS))
        .map(|c| vec![c.to_string()])
}

/// Chat reply plus what was searched to produce it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub response: String,
    pub collection_used: String,
    pub top_k: usize,
    pub sources: Vec<SearchResult>,
}

/// Complete RAG service
pub struct RagService {
    retriever: Arc<Retriever>,
    context_assembler: ContextAssembler,
    composer: Arc<AnswerComposer>,
    config: RetrievalConfig,
}

impl RagService {
    /// Create from existing services
    #[must_use]
    pub fn from_services(
        retriever: Arc<Retriever>,
        composer: Arc<AnswerComposer>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            context_assembler: ContextAssembler::new(),
            composer,
            config,
        }
    }

    fn clamp_top_k(&self, requested: Option<usize>, default: usize) -> usize {
        requested
            .unwrap_or(default)
            .clamp(1, self.config.max_top_k.max(1))
    }

    /// Search → build context → compose. Never fails: a retrieval error
    /// becomes an apology reply.
    pub async fn chat(
        &self,
        prompt: &str,
        collection: Option<&str>,
        top_k: Option<usize>,
    ) -> ChatAnswer {
        let top_k = self.clamp_top_k(top_k, self.config.chat_top_k);
        let collection_used = collection.unwrap_or(ALL_COLLECTIONS).to_string();
        info!("Chat request: {:?} (collection={}, top_k={})", prompt, collection_used, top_k);

        let targets = scoped_targets(collection);
        let results = match self
            .retriever
            .search(
                prompt,
                targets.as_deref(),
                top_k,
                self.config.similarity_threshold,
            )
            .await
        {
            Ok(results) => results,
            Err(e) => {
                error!("Retrieval failed for chat request: {}", e);
                return ChatAnswer {
                    response: build_apology(&e.to_string()),
                    collection_used,
                    top_k,
                    sources: Vec::new(),
                };
            }
        };

        debug!("Retrieved {} results", results.len());
        let context = self.context_assembler.build_context(&results);
        let response = self.composer.compose(prompt, &context).await;
        info!("Chat response ready ({} chars)", response.chars().count());

        ChatAnswer {
            response,
            collection_used,
            top_k,
            sources: results,
        }
    }

    /// Search without generation; `top_k` is clamped to the configured range
    pub async fn search(
        &self,
        query: &str,
        collection: Option<&str>,
        top_k: Option<usize>,
        similarity_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let top_k = self.clamp_top_k(top_k, self.config.default_top_k);
        let targets = scoped_targets(collection);
        self.retriever
            .search(query, targets.as_deref(), top_k, similarity_threshold)
            .await
    }

    /// Persona-only answer without retrieval
    pub async fn ask_ungrounded(&self, prompt: &str) -> String {
        self.composer.compose_ungrounded(prompt).await
    }

    /// Get retriever reference
    #[must_use]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Get context assembler reference
    #[must_use]
    pub const fn context_assembler(&self) -> &ContextAssembler {
        &self.context_assembler
    }
}
