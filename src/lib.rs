pub mod api;
pub mod cli;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod errors;
pub mod indexing;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod errors_tests;

use std::sync::Arc;

use tracing::info;

pub use config::AppConfig;
pub use errors::*;

use crate::documents::TextChunker;
use crate::embeddings::EmbeddingService;
use crate::indexing::FileRecordSource;
use crate::indexing::Indexer;
use crate::indexing::RecordSource;
use crate::llm::ChatBackend;
use crate::llm::GenerationParams;
use crate::llm::LlmService;
use crate::models::IndexingResult;
use crate::rag::AnswerComposer;
use crate::rag::RagService;
use crate::rag::Retriever;
use crate::vector_store::VectorStore;

/// Composition root: every long-lived service, built once and shared
#[derive(Clone)]
pub struct TutorRag {
    pub config: AppConfig,
    pub embeddings: Arc<EmbeddingService>,
    pub store: Arc<VectorStore>,
    pub indexer: Arc<Indexer>,
    pub rag: Arc<RagService>,
}

impl TutorRag {
    /// Build every service from configuration
    ///
    /// # Errors
    /// - HTTP client build errors for the embedding or chat backends
    /// - Snapshot directory errors when persistence is enabled
    pub async fn build(config: &AppConfig) -> Result<Self> {
        let embeddings = Arc::new(EmbeddingService::from_config(&config.embeddings)?);
        let store = Arc::new(VectorStore::open(&config.vector_store).await?);
        let source = Arc::new(FileRecordSource::new(
            config.indexing.data_directory.clone(),
            TextChunker::new(config.indexing.chunk_size, config.indexing.chunk_overlap),
        ));
        let chat = Arc::new(LlmService::new(&config.llm)?);

        info!(
            "Services ready: embeddings={:?}, llm={}, collections={}, persistent={}",
            embeddings.provider(),
            chat.model(),
            store.list_collections().len(),
            store.is_persistent()
        );
        Ok(Self::from_parts(config.clone(), embeddings, store, source, chat))
    }

    /// Wire services from injected parts
    #[must_use]
    pub fn from_parts(
        config: AppConfig,
        embeddings: Arc<EmbeddingService>,
        store: Arc<VectorStore>,
        source: Arc<dyn RecordSource>,
        chat: Arc<dyn ChatBackend>,
    ) -> Self {
        let indexer = Arc::new(Indexer::new(
            source,
            Arc::clone(&embeddings),
            Arc::clone(&store),
            &config.indexing,
        ));
        let retriever = Arc::new(Retriever::new(
            Arc::clone(&embeddings),
            Arc::clone(&store),
            &config.retrieval,
        ));
        let composer = Arc::new(AnswerComposer::new(chat, GenerationParams::from(&config.llm)));
        let rag = Arc::new(RagService::from_services(
            retriever,
            composer,
            config.retrieval.clone(),
        ));

        Self {
            config,
            embeddings,
            store,
            indexer,
            rag,
        }
    }

    /// Index empty collections when `indexing.auto_index_on_startup` is set
    pub async fn auto_index(&self) -> Vec<IndexingResult> {
        if !self.config.indexing.auto_index_on_startup {
            return Vec::new();
        }
        info!("Auto-indexing empty collections");
        self.indexer.index_empty_collections().await
    }

    /// Remove every document from every collection
    pub async fn reset(&self) -> Result<()> {
        for name in self.store.list_collections() {
            self.indexer.clear_collection(&name).await?;
        }
        Ok(())
    }
}
