use thiserror::Error;

#[derive(Error, Debug)]
pub enum TutorRagError {
    #[error("Embedding backend failed for batch {batch_index}: {reason}")]
    EmbeddingBackend { batch_index: usize, reason: String },

    #[error("Malformed {category} record at index {index}: missing or empty field '{field}'")]
    DataShape {
        category: String,
        index: usize,
        field: String,
    },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Generation backend error: {0}")]
    GenerationBackend(String),

    #[error("Dimension mismatch in collection {collection}: expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TutorRagError {
    /// Whether the error means "this collection does not exist"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CollectionNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TutorRagError>;
