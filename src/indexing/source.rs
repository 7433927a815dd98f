//! Read-only access to the system of record

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::documents::DocumentSource;
use crate::documents::TextChunker;
use crate::errors::Result;
use crate::models::Category;
use crate::models::ExerciseSet;
use crate::models::RawExercise;
use crate::models::TextChunk;
use crate::models::VocabCard;

/// Supplies the raw records of a category
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn load(&self, category: Category) -> Result<DocumentSource>;
}

/// Records held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticRecordSource {
    records: HashMap<Category, DocumentSource>,
}

impl StaticRecordSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register records; replaces any earlier records of the same category
    #[must_use]
    pub fn with(mut self, source: DocumentSource) -> Self {
        self.records.insert(source.category(), source);
        self
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn load(&self, category: Category) -> Result<DocumentSource> {
        Ok(self
            .records
            .get(&category)
            .cloned()
            .unwrap_or_else(|| DocumentSource::empty(category)))
    }
}

/// One lesson of word problems as exported from the lesson database
#[derive(Debug, Deserialize)]
struct LessonExercises {
    #[serde(default, rename = "lessonId")]
    lesson_id: Option<serde_json::Value>,
    #[serde(default)]
    option_cards: Vec<String>,
    #[serde(default)]
    questions: Vec<LessonQuestion>,
}

#[derive(Debug, Deserialize)]
struct LessonQuestion {
    #[serde(default)]
    sentence: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

/// One lesson of paired vocabulary cards
#[derive(Debug, Deserialize)]
struct LessonCards {
    #[serde(default)]
    cards: Vec<PairedCard>,
}

#[derive(Debug, Default, Deserialize)]
struct PairedCard {
    #[serde(default)]
    word1: Option<String>,
    #[serde(default)]
    word2: Option<String>,
    #[serde(default)]
    meaning1: Option<String>,
    #[serde(default)]
    meaning2: Option<String>,
    #[serde(default)]
    examples1: Vec<String>,
    #[serde(default)]
    examples2: Vec<String>,
}

fn join_present(parts: [Option<String>; 2], separator: &str) -> Option<String> {
    let present: Vec<String> = parts
        .into_iter()
        .flatten()
        .filter(|p| !p.trim().is_empty())
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.join(separator))
    }
}

/// `lessonId` when present, else the 1-based position of the lesson
fn lesson_label(value: Option<&serde_json::Value>, position: usize) -> String {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => position.to_string(),
    }
}

/// Question ids must stay unique across lessons, so a repeated label
/// gets a `_{n}` suffix.
fn flatten_exercises(lessons: Vec<LessonExercises>) -> ExerciseSet {
    let mut set = ExerciseSet::default();
    let mut used: HashSet<String> = HashSet::new();
    for (lesson_idx, lesson) in lessons.into_iter().enumerate() {
        let base = lesson_label(lesson.lesson_id.as_ref(), lesson_idx + 1);
        let mut label = base.clone();
        let mut suffix = 1;
        while used.contains(&label) {
            suffix += 1;
            label = format!("{base}_{suffix}");
        }
        if label != base {
            warn!("Duplicate lesson label {}, using {}", base, label);
        }
        used.insert(label.clone());
        for (idx, question) in lesson.questions.into_iter().enumerate() {
            let number = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            set.questions.push(RawExercise {
                id: Some(format!("lesson{label}_q{number}")),
                number: Some(number),
                sentence: question.sentence,
                answer: question.answer,
            });
        }
        set.option_cards.extend(lesson.option_cards);
    }
    set
}

fn flatten_cards(lessons: Vec<LessonCards>) -> Vec<VocabCard> {
    lessons
        .into_iter()
        .flat_map(|lesson| lesson.cards)
        .map(|card| {
            let mut examples = card.examples1;
            examples.extend(card.examples2);
            VocabCard {
                word: join_present([card.word1, card.word2], "/"),
                meaning: join_present([card.meaning1, card.meaning2], " | "),
                examples,
            }
        })
        .collect()
}

/// Reads JSON exports and plain-text references from a data directory.
/// A missing file means an empty record set.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    data_directory: PathBuf,
    chunker: TextChunker,
}

impl FileRecordSource {
    pub fn new(data_directory: impl Into<PathBuf>, chunker: TextChunker) -> Self {
        Self {
            data_directory: data_directory.into(),
            chunker,
        }
    }

    #[must_use]
    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Option<T>> {
        let path = self.data_directory.join(file);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Reading records from {}", path.display());
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No record file at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn read_reference_texts(&self) -> Result<Vec<TextChunk>> {
        let directory = self.data_directory.join("reference");
        let mut entries = match tokio::fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("txt") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut chunks = Vec::new();
        for path in paths {
            let text = tokio::fs::read_to_string(&path).await?;
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("reference")
                .to_string();
            let file_chunks = self.chunker.chunk_document(&stem, &text);
            info!("Chunked {} into {} pieces", path.display(), file_chunks.len());
            chunks.extend(file_chunks);
        }
        Ok(chunks)
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn load(&self, category: Category) -> Result<DocumentSource> {
        let file = format!("{}.json", category.collection_name());
        let source = match category {
            Category::WordProblems => {
                let lessons: Vec<LessonExercises> =
                    self.read_json(&file).await?.unwrap_or_default();
                DocumentSource::Exercises(flatten_exercises(lessons))
            }
            Category::VocabularyCards => {
                let lessons: Vec<LessonCards> = self.read_json(&file).await?.unwrap_or_default();
                DocumentSource::VocabularyCards(flatten_cards(lessons))
            }
            Category::ReferenceDocuments => {
                let mut chunks: Vec<TextChunk> = self.read_json(&file).await?.unwrap_or_default();
                chunks.extend(self.read_reference_texts().await?);
                DocumentSource::ReferenceChunks(chunks)
            }
        };
        info!("Loaded {} {} records", source.len(), category);
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileRecordSource::new(dir.path(), TextChunker::default());
        for category in Category::ALL {
            assert!(source.load(category).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_word_problem_lessons_are_flattened() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("korean_word_problems.json"),
            r#"[
                {"lessonId": 1, "option_cards": ["더하기"],
                 "questions": [{"sentence": "s1", "answer": "a1"}, {"sentence": "s2", "answer": "a2"}]},
                {"lessonId": "2", "option_cards": ["빼기"],
                 "questions": [{"sentence": "s3", "answer": "a3"}]}
            ]"#,
        )
        .unwrap();

        let source = FileRecordSource::new(dir.path(), TextChunker::default());
        let DocumentSource::Exercises(set) = source.load(Category::WordProblems).await.unwrap()
        else {
            panic!("wrong variant");
        };
        let ids: Vec<_> = set.questions.iter().map(|q| q.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["lesson1_q1", "lesson1_q2", "lesson2_q1"]);
        assert_eq!(set.questions[2].number, Some(1));
        assert_eq!(set.option_cards, vec!["더하기", "빼기"]);
    }

    #[tokio::test]
    async fn test_lessons_without_id_get_distinct_labels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("korean_word_problems.json"),
            r#"[
                {"questions": [{"sentence": "s1", "answer": "a1"}]},
                {"questions": [{"sentence": "s2", "answer": "a2"}]},
                {"lessonId": 7, "questions": [{"sentence": "s3", "answer": "a3"}]},
                {"lessonId": "7", "questions": [{"sentence": "s4", "answer": "a4"}]}
            ]"#,
        )
        .unwrap();

        let source = FileRecordSource::new(dir.path(), TextChunker::default());
        let DocumentSource::Exercises(set) = source.load(Category::WordProblems).await.unwrap()
        else {
            panic!("wrong variant");
        };
        let ids: Vec<_> = set.questions.iter().map(|q| q.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["lesson1_q1", "lesson2_q1", "lesson7_q1", "lesson7_2_q1"]);
    }

    #[tokio::test]
    async fn test_lessons_without_id_all_reach_the_store() {
        use std::sync::Arc;

        use crate::config::EmbeddingsConfig;
        use crate::config::IndexingConfig;
        use crate::embeddings::EmbeddingService;
        use crate::indexing::Indexer;
        use crate::vector_store::VectorStore;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("korean_word_problems.json"),
            r#"[
                {"questions": [{"sentence": "사과 두 개", "answer": "2"}]},
                {"questions": [{"sentence": "배 세 개", "answer": "3"}]}
            ]"#,
        )
        .unwrap();

        let embeddings = EmbeddingService::from_config(&EmbeddingsConfig {
            dimension: 32,
            ..EmbeddingsConfig::default()
        })
        .unwrap();
        let store = Arc::new(VectorStore::in_memory());
        let indexer = Indexer::new(
            Arc::new(FileRecordSource::new(dir.path(), TextChunker::default())),
            Arc::new(embeddings),
            Arc::clone(&store),
            &IndexingConfig {
                yield_ms: 0,
                ..IndexingConfig::default()
            },
        );

        let result = indexer.index_category(Category::WordProblems).await;
        assert_eq!(result.indexed_count, 2);
        assert_eq!(result.total_documents, 2);
        let handle = store.collection("korean_word_problems").unwrap();
        assert_eq!(store.count(&handle).await, 2);
    }

    #[tokio::test]
    async fn test_paired_cards_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("card_check.json"),
            r#"[{"cards": [{"word1": "크다", "word2": "작다",
                            "meaning1": "big", "meaning2": "small",
                            "examples1": ["큰 나무"], "examples2": ["작은 꽃"]}]}]"#,
        )
        .unwrap();

        let source = FileRecordSource::new(dir.path(), TextChunker::default());
        let DocumentSource::VocabularyCards(cards) =
            source.load(Category::VocabularyCards).await.unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(cards[0].word.as_deref(), Some("크다/작다"));
        assert_eq!(cards[0].meaning.as_deref(), Some("big | small"));
        assert_eq!(cards[0].examples, vec!["큰 나무", "작은 꽃"]);
    }

    #[tokio::test]
    async fn test_reference_texts_are_chunked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("reference")).unwrap();
        std::fs::write(dir.path().join("reference/rules.txt"), "제1항 뛰지 않기\n제2항 손 씻기").unwrap();

        let source = FileRecordSource::new(dir.path(), TextChunker::default());
        let DocumentSource::ReferenceChunks(chunks) =
            source.load(Category::ReferenceDocuments).await.unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id.as_deref(), Some("rules_0"));
    }

    #[tokio::test]
    async fn test_static_source_defaults_to_empty() {
        let source = StaticRecordSource::new()
            .with(DocumentSource::VocabularyCards(vec![VocabCard::new("a", "b")]));
        assert_eq!(source.load(Category::VocabularyCards).await.unwrap().len(), 1);
        assert!(source.load(Category::WordProblems).await.unwrap().is_empty());
    }
}
