//! Converts raw records into uniform documents for indexing

pub mod chunker;

pub use chunker::TextChunker;

use crate::errors::Result;
use crate::errors::TutorRagError;
use crate::models::Category;
use crate::models::Document;
use crate::models::ExerciseSet;
use crate::models::Metadata;
use crate::models::MetadataValue;
use crate::models::TextChunk;
use crate::models::VocabCard;

/// Raw records of one category, as delivered by a record source
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource {
    Exercises(ExerciseSet),
    VocabularyCards(Vec<VocabCard>),
    ReferenceChunks(Vec<TextChunk>),
}

impl DocumentSource {
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Exercises(_) => Category::WordProblems,
            Self::VocabularyCards(_) => Category::VocabularyCards,
            Self::ReferenceChunks(_) => Category::ReferenceDocuments,
        }
    }

    /// Number of raw records
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Exercises(set) => set.questions.len() + set.option_cards.len(),
            Self::VocabularyCards(cards) => cards.len(),
            Self::ReferenceChunks(chunks) => chunks.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty record set for the category
    #[must_use]
    pub fn empty(category: Category) -> Self {
        match category {
            Category::WordProblems => Self::Exercises(ExerciseSet::default()),
            Category::VocabularyCards => Self::VocabularyCards(Vec::new()),
            Category::ReferenceDocuments => Self::ReferenceChunks(Vec::new()),
        }
    }
}

/// Turn raw records into documents. Pure; a missing required field aborts
/// with `DataShape` naming the record.
pub fn prepare(source: DocumentSource) -> Result<Vec<Document>> {
    let category = source.category();
    match source {
        DocumentSource::Exercises(set) => prepare_exercises(category, set),
        DocumentSource::VocabularyCards(cards) => prepare_cards(category, cards),
        DocumentSource::ReferenceChunks(chunks) => prepare_chunks(category, chunks),
    }
}

fn required(
    category: Category,
    index: usize,
    field: &str,
    value: Option<String>,
) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TutorRagError::DataShape {
            category: category.collection_name().to_string(),
            index,
            field: field.to_string(),
        }),
    }
}

fn prepare_exercises(category: Category, set: ExerciseSet) -> Result<Vec<Document>> {
    let collection = category.collection_name();
    let mut documents = Vec::with_capacity(set.questions.len() + set.option_cards.len());

    for (index, exercise) in set.questions.into_iter().enumerate() {
        let number = exercise.number.ok_or_else(|| TutorRagError::DataShape {
            category: collection.to_string(),
            index,
            field: "number".to_string(),
        })?;
        let sentence = required(category, index, "sentence", exercise.sentence)?;
        let answer = required(category, index, "answer", exercise.answer)?;

        let id = exercise
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("question_{number}"));

        let mut metadata = Metadata::new();
        metadata.insert("type".to_string(), "question".into());
        metadata.insert("number".to_string(), MetadataValue::Int(i64::from(number)));
        metadata.insert("sentence".to_string(), sentence.clone().into());
        metadata.insert("answer".to_string(), answer.clone().into());
        metadata.insert("collection".to_string(), collection.into());

        documents.push(Document {
            id,
            text: format!("question {number}: {sentence} answer: {answer}"),
            metadata,
        });
    }

    for (card_index, token) in set.option_cards.into_iter().enumerate() {
        let token = required(category, card_index, "option_card", Some(token))?;

        let mut metadata = Metadata::new();
        metadata.insert("type".to_string(), "option_card".into());
        metadata.insert("card_index".to_string(), card_index.into());
        metadata.insert("content".to_string(), token.clone().into());
        metadata.insert("collection".to_string(), collection.into());

        documents.push(Document {
            id: format!("option_card_{card_index}"),
            text: token,
            metadata,
        });
    }

    Ok(documents)
}

fn prepare_cards(category: Category, cards: Vec<VocabCard>) -> Result<Vec<Document>> {
    let collection = category.collection_name();
    let mut documents = Vec::with_capacity(cards.len());

    for (index, card) in cards.into_iter().enumerate() {
        let word = required(category, index, "word", card.word)?;
        let meaning = required(category, index, "meaning", card.meaning)?;
        let examples: Vec<String> = card
            .examples
            .into_iter()
            .filter(|e| !e.trim().is_empty())
            .collect();
        let joined = examples.join(", ");

        let mut text = format!("word: {word} meaning: {meaning}");
        if !examples.is_empty() {
            text.push_str(&format!(" examples: {joined}"));
        }

        let mut metadata = Metadata::new();
        metadata.insert("type".to_string(), "card".into());
        metadata.insert("word".to_string(), word.into());
        metadata.insert("meaning".to_string(), meaning.into());
        metadata.insert("examples".to_string(), joined.into());
        metadata.insert("collection".to_string(), collection.into());

        documents.push(Document {
            id: format!("card_{index}"),
            text,
            metadata,
        });
    }

    Ok(documents)
}

fn prepare_chunks(category: Category, chunks: Vec<TextChunk>) -> Result<Vec<Document>> {
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            Ok(Document {
                id: required(category, index, "id", chunk.id)?,
                text: required(category, index, "text", chunk.text)?,
                metadata: chunk.metadata,
            })
        })
        .collect()
}
