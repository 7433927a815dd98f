//! Domain types shared by the indexing and retrieval paths

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::TutorRagError;

/// A flat metadata value. Nested structures are unrepresentable on purpose:
/// collections must be stringified before they become metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for MetadataValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// The unit of indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Document categories; each one owns exactly one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    WordProblems,
    VocabularyCards,
    ReferenceDocuments,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::WordProblems,
        Category::VocabularyCards,
        Category::ReferenceDocuments,
    ];

    /// Physical collection name in the vector store
    #[must_use]
    pub const fn collection_name(self) -> &'static str {
        match self {
            Self::WordProblems => "korean_word_problems",
            Self::VocabularyCards => "card_check",
            Self::ReferenceDocuments => "pdf_documents",
        }
    }

    /// Descriptive tags attached to the collection
    #[must_use]
    pub fn collection_metadata(self) -> Metadata {
        let mut meta = Metadata::new();
        meta.insert("language".to_string(), "korean".into());
        match self {
            Self::WordProblems => {
                meta.insert("type".to_string(), "educational".into());
                meta.insert("category".to_string(), "word_problems".into());
            }
            Self::VocabularyCards => {
                meta.insert("type".to_string(), "educational".into());
                meta.insert("category".to_string(), "vocabulary".into());
            }
            Self::ReferenceDocuments => {
                meta.insert("type".to_string(), "document".into());
                meta.insert("category".to_string(), "reference".into());
                meta.insert("source".to_string(), "pdf".into());
            }
        }
        meta
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

impl FromStr for Category {
    type Err = TutorRagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word_problems" | "korean_word_problems" => Ok(Self::WordProblems),
            "vocabulary_cards" | "cards" | "card_check" => Ok(Self::VocabularyCards),
            "reference_documents" | "reference" | "pdf_documents" => {
                Ok(Self::ReferenceDocuments)
            }
            other => Err(TutorRagError::CollectionNotFound(other.to_string())),
        }
    }
}

/// One exercise as loaded from the system of record.
/// Required fields are optional here so the preparer can report shape errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExercise {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub sentence: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Exercises plus the option tokens offered to the learner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    #[serde(default)]
    pub questions: Vec<RawExercise>,
    #[serde(default)]
    pub option_cards: Vec<String>,
}

impl ExerciseSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty() && self.option_cards.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabCard {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub meaning: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl VocabCard {
    pub fn new(word: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            word: Some(word.into()),
            meaning: Some(meaning.into()),
            examples: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_examples(mut self, examples: Vec<String>) -> Self {
        self.examples = examples;
        self
    }
}

/// A pre-segmented piece of long-form reference text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A ranked retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub document_text: String,
    pub metadata: Metadata,
    pub distance: f32,
    pub source_collection: String,
}

impl SearchResult {
    /// `1 - distance`, used for thresholds and display
    #[must_use]
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexingStatus {
    Success,
    Error,
}

/// Outcome of indexing one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingResult {
    pub status: IndexingStatus,
    pub collection: String,
    pub indexed_count: usize,
    pub total_documents: usize,
    pub failed_batches: usize,
    pub message: String,
}

impl IndexingResult {
    pub fn success(
        collection: impl Into<String>,
        indexed_count: usize,
        total_documents: usize,
        failed_batches: usize,
    ) -> Self {
        let collection = collection.into();
        Self {
            message: format!("indexed {indexed_count}/{total_documents} documents into {collection}"),
            status: IndexingStatus::Success,
            collection,
            indexed_count,
            total_documents,
            failed_batches,
        }
    }

    pub fn error(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: IndexingStatus::Error,
            collection: collection.into(),
            indexed_count: 0,
            total_documents: 0,
            failed_batches: 0,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == IndexingStatus::Success
    }
}

/// Aggregate of an `index_all` run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingSummary {
    pub total_collections: usize,
    pub successful_collections: usize,
    pub results: HashMap<String, IndexingResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Acknowledgement of an administrative clear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearAck {
    pub collection: String,
    pub removed: usize,
}

/// Name, tags and size of one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: usize,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_by_collection_name() {
        for category in Category::ALL {
            let parsed: Category = category.collection_name().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn test_unknown_category_is_not_found() {
        let err = "grades".parse::<Category>().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_collection_metadata_is_tagged() {
        let meta = Category::ReferenceDocuments.collection_metadata();
        assert_eq!(meta.get("type"), Some(&MetadataValue::from("document")));
        assert_eq!(meta.get("language"), Some(&MetadataValue::from("korean")));
    }

    #[test]
    fn test_metadata_value_untagged_json() {
        let meta: Metadata =
            serde_json::from_str(r#"{"a": "x", "b": 3, "c": 1.5, "d": true}"#).unwrap();
        assert_eq!(meta["a"], MetadataValue::Text("x".to_string()));
        assert_eq!(meta["b"], MetadataValue::Int(3));
        assert_eq!(meta["c"], MetadataValue::Float(1.5));
        assert_eq!(meta["d"], MetadataValue::Bool(true));
    }

    #[test]
    fn test_nested_metadata_is_rejected() {
        let parsed: Result<Metadata, _> = serde_json::from_str(r#"{"a": {"nested": 1}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_similarity_is_one_minus_distance() {
        let hit = SearchResult {
            id: "a".to_string(),
            document_text: "t".to_string(),
            metadata: Metadata::new(),
            distance: 0.25,
            source_collection: "card_check".to_string(),
        };
        assert!((hit.similarity() - 0.75).abs() < f32::EPSILON);
    }
}
