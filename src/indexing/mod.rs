//! Indexing orchestrator: records → documents → embeddings → collections

pub mod source;

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::error;
use tracing::info;
use tracing::warn;

pub use source::FileRecordSource;
pub use source::RecordSource;
pub use source::StaticRecordSource;

use crate::config::IndexingConfig;
use crate::documents::prepare;
use crate::embeddings::EmbeddingService;
use crate::errors::Result;
use crate::models::Category;
use crate::models::ClearAck;
use crate::models::CollectionInfo;
use crate::models::Document;
use crate::models::IndexingResult;
use crate::models::IndexingSummary;
use crate::vector_store::CollectionHandle;
use crate::vector_store::VectorStore;

pub struct Indexer {
    source: Arc<dyn RecordSource>,
    embeddings: Arc<EmbeddingService>,
    store: Arc<VectorStore>,
    batch_size: usize,
    yield_delay: Duration,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn RecordSource>,
        embeddings: Arc<EmbeddingService>,
        store: Arc<VectorStore>,
        config: &IndexingConfig,
    ) -> Self {
        Self {
            source,
            embeddings,
            store,
            batch_size: config.batch_size.max(1),
            yield_delay: Duration::from_millis(config.yield_ms),
        }
    }

    /// Index one category. Never fails: problems become an error result.
    pub async fn index_category(&self, category: Category) -> IndexingResult {
        let collection = category.collection_name();
        info!("Indexing {}", collection);

        let documents = match self.load_documents(category).await {
            Ok(documents) => documents,
            Err(e) => {
                error!("Failed to prepare {} records: {}", collection, e);
                return IndexingResult::error(collection, e.to_string());
            }
        };
        if documents.is_empty() {
            warn!("No source records for {}", collection);
            return IndexingResult::error(collection, format!("no source records for {collection}"));
        }

        let handle = match self
            .store
            .get_or_create(collection, category.collection_metadata())
            .await
        {
            Ok(handle) => handle,
            Err(e) => return IndexingResult::error(collection, e.to_string()),
        };

        self.index_documents(&handle, documents).await
    }

    async fn load_documents(&self, category: Category) -> Result<Vec<Document>> {
        let records = self.source.load(category).await?;
        prepare(records)
    }

    async fn index_documents(
        &self,
        handle: &CollectionHandle,
        documents: Vec<Document>,
    ) -> IndexingResult {
        let collection = handle.name();
        let total = documents.len();
        let total_batches = total.div_ceil(self.batch_size);
        let mut stored: HashSet<&str> = HashSet::new();
        let mut failed_batches = 0usize;

        info!(
            "Indexing {} documents into {} ({} batches)",
            total, collection, total_batches
        );

        for (batch_idx, batch) in documents.chunks(self.batch_size).enumerate() {
            match self.index_batch(handle, batch).await {
                Ok(_) => {
                    stored.extend(batch.iter().map(|d| d.id.as_str()));
                    let progress = stored.len() as f64 / total as f64 * 100.0;
                    info!(
                        "{} progress: {}/{} ({:.1}%)",
                        collection,
                        stored.len(),
                        total,
                        progress
                    );
                }
                Err(e) => {
                    failed_batches += 1;
                    error!(
                        "Batch {}/{} of {} failed, skipping: {}",
                        batch_idx + 1,
                        total_batches,
                        collection,
                        e
                    );
                }
            }
            tokio::time::sleep(self.yield_delay).await;
        }

        let indexed = stored.len();
        info!(
            "Finished {}: {} indexed, {} failed batches",
            collection, indexed, failed_batches
        );
        IndexingResult::success(collection, indexed, total, failed_batches)
    }

    async fn index_batch(&self, handle: &CollectionHandle, batch: &[Document]) -> Result<usize> {
        let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
        let embeddings = self.embeddings.embed_many(&texts).await?;

        let ids = batch.iter().map(|d| d.id.clone()).collect();
        let metadatas = batch.iter().map(|d| d.metadata.clone()).collect();
        self.store
            .upsert(handle, ids, embeddings, texts, metadatas)
            .await
    }

    /// Index every category concurrently; one failure never cancels the others
    pub async fn index_all(self: &Arc<Self>) -> IndexingSummary {
        let started_at = Utc::now();
        info!("Indexing all {} categories", Category::ALL.len());

        let tasks = Category::ALL.map(|category| {
            let indexer = Arc::clone(self);
            tokio::spawn(async move { indexer.index_category(category).await })
        });
        let joined = futures::future::join_all(tasks).await;

        let mut results = HashMap::new();
        for (category, outcome) in Category::ALL.into_iter().zip(joined) {
            let collection = category.collection_name();
            let result = outcome.unwrap_or_else(|e| {
                error!("Indexing task for {} aborted: {}", collection, e);
                IndexingResult::error(collection, format!("indexing task aborted: {e}"))
            });
            results.insert(collection.to_string(), result);
        }

        let successful_collections = results.values().filter(|r| r.is_success()).count();
        info!(
            "Indexing finished: {}/{} collections succeeded",
            successful_collections,
            results.len()
        );

        IndexingSummary {
            total_collections: results.len(),
            successful_collections,
            results,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Index the categories whose collection currently holds no documents
    pub async fn index_empty_collections(&self) -> Vec<IndexingResult> {
        let mut results = Vec::new();
        for category in Category::ALL {
            let empty = match self.store.collection(category.collection_name()) {
                Ok(handle) => self.store.count(&handle).await == 0,
                Err(_) => true,
            };
            if empty {
                results.push(self.index_category(category).await);
            }
        }
        results
    }

    /// Remove every document of a collection; the collection stays registered
    pub async fn clear_collection(&self, name: &str) -> Result<ClearAck> {
        let handle = self.store.collection(name)?;
        let removed = self.store.delete_all(&handle).await?;
        info!("Cleared {} documents from {}", removed, name);
        Ok(ClearAck {
            collection: name.to_string(),
            removed,
        })
    }

    /// Per-collection document counts
    pub async fn status(&self) -> Vec<CollectionInfo> {
        let mut infos = Vec::new();
        for name in self.store.list_collections() {
            if let Ok(info) = self.store.collection_info(&name).await {
                infos.push(info);
            }
        }
        infos
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::config::EmbeddingsConfig;
    use crate::documents::DocumentSource;
    use crate::embeddings::EmbeddingBackend;
    use crate::embeddings::HashingEncoder;
    use crate::embeddings::LocalEmbedder;
    use crate::embeddings::TextEncoder;
    use crate::errors::TutorRagError;
    use crate::models::ExerciseSet;
    use crate::models::RawExercise;
    use crate::models::VocabCard;

    fn embeddings() -> Arc<EmbeddingService> {
        let config = EmbeddingsConfig {
            dimension: 64,
            ..EmbeddingsConfig::default()
        };
        Arc::new(EmbeddingService::from_config(&config).unwrap())
    }

    fn indexing_config(batch_size: usize) -> IndexingConfig {
        IndexingConfig {
            batch_size,
            yield_ms: 0,
            ..IndexingConfig::default()
        }
    }

    fn cards(n: usize) -> DocumentSource {
        DocumentSource::VocabularyCards(
            (0..n)
                .map(|i| VocabCard::new(format!("단어{i}"), format!("뜻{i}")))
                .collect(),
        )
    }

    fn indexer(source: impl RecordSource + 'static, batch_size: usize) -> (Arc<Indexer>, Arc<VectorStore>) {
        let store = Arc::new(VectorStore::in_memory());
        let indexer = Indexer::new(
            Arc::new(source),
            embeddings(),
            Arc::clone(&store),
            &indexing_config(batch_size),
        );
        (Arc::new(indexer), store)
    }

    /// Rejects any batch that mentions "BAD"
    struct RejectingEncoder(HashingEncoder);

    impl TextEncoder for RejectingEncoder {
        fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.iter().any(|t| t.contains("BAD")) {
                return Err(TutorRagError::InvalidInput("rejected batch".to_string()));
            }
            self.0.encode(texts)
        }

        fn dimension(&self) -> usize {
            self.0.dimension()
        }
    }

    struct BrokenWordProblems;

    #[async_trait]
    impl RecordSource for BrokenWordProblems {
        async fn load(&self, category: Category) -> Result<DocumentSource> {
            match category {
                Category::WordProblems => Err(TutorRagError::HttpError(
                    "lesson database unreachable".to_string(),
                )),
                Category::VocabularyCards => Ok(cards(2)),
                Category::ReferenceDocuments => Ok(DocumentSource::ReferenceChunks(vec![
                    crate::models::TextChunk {
                        id: Some("rules_0".to_string()),
                        text: Some("복도에서 뛰지 않아요".to_string()),
                        metadata: Default::default(),
                    },
                ])),
            }
        }
    }

    #[tokio::test]
    async fn test_index_category_counts_across_batches() {
        let (indexer, store) = indexer(StaticRecordSource::new().with(cards(7)), 3);
        let result = indexer.index_category(Category::VocabularyCards).await;
        assert!(result.is_success());
        assert_eq!(result.indexed_count, 7);
        assert_eq!(result.total_documents, 7);
        assert_eq!(result.failed_batches, 0);

        let handle = store.collection("card_check").unwrap();
        assert_eq!(store.count(&handle).await, 7);
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped() {
        let encoder = RejectingEncoder(HashingEncoder::new(64));
        let embeddings = EmbeddingService::new(
            EmbeddingBackend::Local(LocalEmbedder::new(Arc::new(encoder), 1)),
            None,
            1,
            Duration::ZERO,
            64,
        );
        let source = StaticRecordSource::new().with(DocumentSource::VocabularyCards(vec![
            VocabCard::new("사과", "과일"),
            VocabCard::new("BAD", "거절"),
            VocabCard::new("배", "과일"),
        ]));
        let store = Arc::new(VectorStore::in_memory());
        let indexer = Indexer::new(
            Arc::new(source),
            Arc::new(embeddings),
            Arc::clone(&store),
            &indexing_config(1),
        );

        let result = indexer.index_category(Category::VocabularyCards).await;
        assert!(result.is_success());
        assert_eq!(result.indexed_count, 2);
        assert_eq!(result.total_documents, 3);
        assert_eq!(result.failed_batches, 1);

        let handle = store.collection("card_check").unwrap();
        assert_eq!(store.count(&handle).await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_ids_count_once() {
        let chunk = |text: &str| crate::models::TextChunk {
            id: Some("rules_0".to_string()),
            text: Some(text.to_string()),
            metadata: Default::default(),
        };
        let source = StaticRecordSource::new().with(DocumentSource::ReferenceChunks(vec![
            chunk("복도에서 뛰지 않아요"),
            chunk("교실에서 조용히 해요"),
        ]));
        let (indexer, store) = indexer(source, 1);
        let result = indexer.index_category(Category::ReferenceDocuments).await;
        assert!(result.is_success());
        assert_eq!(result.indexed_count, 1);

        let handle = store.collection("pdf_documents").unwrap();
        assert_eq!(store.count(&handle).await, 1);
    }

    #[tokio::test]
    async fn test_reindexing_is_idempotent() {
        let (indexer, store) = indexer(StaticRecordSource::new().with(cards(4)), 100);
        indexer.index_category(Category::VocabularyCards).await;
        indexer.index_category(Category::VocabularyCards).await;
        let handle = store.collection("card_check").unwrap();
        assert_eq!(store.count(&handle).await, 4);
    }

    #[tokio::test]
    async fn test_empty_records_are_an_error_result() {
        let (indexer, _) = indexer(StaticRecordSource::new(), 100);
        let result = indexer.index_category(Category::WordProblems).await;
        assert!(!result.is_success());
        assert!(result.message.contains("no source records"));
    }

    #[tokio::test]
    async fn test_malformed_record_fails_the_category() {
        let set = ExerciseSet {
            questions: vec![RawExercise {
                id: None,
                number: Some(1),
                sentence: None,
                answer: Some("3".to_string()),
            }],
            option_cards: Vec::new(),
        };
        let (indexer, _) = indexer(StaticRecordSource::new().with(DocumentSource::Exercises(set)), 100);
        let result = indexer.index_category(Category::WordProblems).await;
        assert!(!result.is_success());
        assert_eq!(result.indexed_count, 0);
        assert!(result.message.contains("sentence"));
    }

    #[tokio::test]
    async fn test_index_all_isolates_failures() {
        let (indexer, _) = indexer(BrokenWordProblems, 100);
        let summary = indexer.index_all().await;

        assert_eq!(summary.total_collections, 3);
        assert_eq!(summary.successful_collections, 2);
        let failed = &summary.results["korean_word_problems"];
        assert!(!failed.is_success());
        assert_eq!(failed.indexed_count, 0);
        assert!(failed.message.contains("lesson database unreachable"));
        assert_eq!(summary.results["card_check"].indexed_count, 2);
        assert!(summary.finished_at >= summary.started_at);
    }

    #[tokio::test]
    async fn test_clear_collection_keeps_it_registered() {
        let (indexer, store) = indexer(StaticRecordSource::new().with(cards(3)), 100);
        indexer.index_category(Category::VocabularyCards).await;

        let ack = indexer.clear_collection("card_check").await.unwrap();
        assert_eq!(ack.removed, 3);
        let handle = store.collection("card_check").unwrap();
        assert_eq!(store.count(&handle).await, 0);

        assert!(indexer.clear_collection("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_index_empty_collections_skips_populated() {
        let (indexer, _) = indexer(StaticRecordSource::new().with(cards(2)), 100);
        indexer.index_category(Category::VocabularyCards).await;

        let results = indexer.index_empty_collections().await;
        let touched: Vec<_> = results.iter().map(|r| r.collection.as_str()).collect();
        assert_eq!(touched, vec!["korean_word_problems", "pdf_documents"]);
    }
}
