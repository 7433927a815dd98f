use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::TutorRagError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
        }
    }
}

/// Which embedding backend serves the primary path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible HTTP API, with the local encoder as fallback
    Remote,
    /// In-process encoder only
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Local
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

pub(crate) fn default_dimension() -> usize {
    1536
}

pub(crate) fn default_embedding_batch_size() -> usize {
    50
}

pub(crate) fn default_max_workers() -> usize {
    4
}

fn default_rate_limit_delay_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            endpoint: default_embedding_endpoint(),
            api_key: String::new(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_embedding_batch_size(),
            max_workers: default_max_workers(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,
    #[serde(default)]
    pub llm_key: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub(crate) fn default_max_tokens() -> usize {
    500
}

pub(crate) fn default_temperature() -> f32 {
    0.7
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_endpoint: default_llm_endpoint(),
            llm_key: String::new(),
            llm_model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Directory for JSON collection snapshots; in-memory only when unset
    #[serde(default)]
    pub persist_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_indexing_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_yield_ms")]
    pub yield_ms: u64,
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default)]
    pub auto_index_on_startup: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

pub(crate) fn default_indexing_batch_size() -> usize {
    100
}

fn default_yield_ms() -> u64 {
    10
}

fn default_data_directory() -> PathBuf {
    PathBuf::from("data")
}

pub(crate) fn default_chunk_size() -> usize {
    800
}

pub(crate) fn default_chunk_overlap() -> usize {
    200
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_indexing_batch_size(),
            yield_ms: default_yield_ms(),
            data_directory: default_data_directory(),
            auto_index_on_startup: false,
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    /// top-k used by chat requests that name none
    #[serde(default = "default_chat_top_k")]
    pub chat_top_k: usize,
    /// Applied to chat requests when set; search requests pass their own
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
    #[serde(default = "default_threshold_multiplier")]
    pub threshold_multiplier: usize,
    /// Collections searched when a request names none
    #[serde(default = "default_collections")]
    pub default_collections: Vec<String>,
}

pub(crate) fn default_top_k() -> usize {
    3
}

fn default_max_top_k() -> usize {
    10
}

pub(crate) fn default_chat_top_k() -> usize {
    5
}

pub(crate) fn default_threshold_multiplier() -> usize {
    2
}

fn default_collections() -> Vec<String> {
    crate::models::Category::ALL
        .iter()
        .map(|c| c.collection_name().to_string())
        .collect()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            chat_top_k: default_chat_top_k(),
            similarity_threshold: None,
            threshold_multiplier: default_threshold_multiplier(),
            default_collections: default_collections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_cors(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from default config file path
    pub fn load() -> crate::Result<Self> {
        // Try config.toml first, then config.example.toml, then built-in defaults
        if Path::new("config.toml").exists() {
            Self::from_file("config.toml")
        } else if Path::new("config.example.toml").exists() {
            tracing::warn!(
                "Using config.example.toml. Please create config.toml for production use."
            );
            Self::from_file("config.example.toml")
        } else {
            tracing::warn!("No config file found, using built-in defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Fill empty API keys from `OPENAI_API_KEY`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                if self.embeddings.api_key.is_empty() {
                    self.embeddings.api_key = key.clone();
                }
                if self.llm.llm_key.is_empty() {
                    self.llm.llm_key = key;
                }
            }
        }
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        for (name, endpoint) in [
            ("embeddings.endpoint", &self.embeddings.endpoint),
            ("llm.llm_endpoint", &self.llm.llm_endpoint),
        ] {
            url::Url::parse(endpoint).map_err(|e| {
                TutorRagError::ConfigError(format!("{name} is not a valid URL ({endpoint}): {e}"))
            })?;
        }

        let positive = [
            ("embeddings.dimension", self.embeddings.dimension),
            ("embeddings.batch_size", self.embeddings.batch_size),
            ("embeddings.max_workers", self.embeddings.max_workers),
            ("indexing.batch_size", self.indexing.batch_size),
            ("indexing.chunk_size", self.indexing.chunk_size),
            ("retrieval.threshold_multiplier", self.retrieval.threshold_multiplier),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(TutorRagError::ConfigError(format!("{name} must be > 0")));
            }
        }

        if self.indexing.chunk_overlap >= self.indexing.chunk_size {
            return Err(TutorRagError::ConfigError(
                "indexing.chunk_overlap must be smaller than indexing.chunk_size".to_string(),
            ));
        }

        if let Some(threshold) = self.retrieval.similarity_threshold {
            if !(-1.0..=1.0).contains(&threshold) {
                return Err(TutorRagError::ConfigError(format!(
                    "retrieval.similarity_threshold must be within [-1, 1], got {threshold}"
                )));
            }
        }

        Ok(())
    }

    /// Get embedding dimension
    pub fn embedding_dimension(&self) -> usize {
        self.embeddings.dimension
    }

    /// Get embedding model name
    pub fn embedding_model(&self) -> &str {
        &self.embeddings.model
    }

    /// Get LLM endpoint
    pub fn llm_endpoint(&self) -> &str {
        &self.llm.llm_endpoint
    }

    /// Get LLM model
    pub fn llm_model(&self) -> &str {
        &self.llm.llm_model
    }
}
