//! Embeddings generation module
//!
//! Text is turned into fixed-length vectors by either a remote
//! OpenAI-compatible API or an in-process hashing encoder. With a remote
//! primary, any batch that fails is retried once on the local encoder.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tutorrag::config::AppConfig;
//! use tutorrag::embeddings::EmbeddingService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let service = EmbeddingService::from_config(&config.embeddings)?;
//!
//!     let embedding = service.embed_one("사과는 몇 개인가요?").await?;
//!     println!("Generated embedding with {} dimensions", embedding.len());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod generator;
pub mod local;

pub use client::RemoteEmbeddingClient;
pub use generator::BatchOutcome;
pub use generator::EmbeddingBackend;
pub use generator::EmbeddingReport;
pub use generator::EmbeddingService;
pub use local::HashingEncoder;
pub use local::LocalEmbedder;
pub use local::TextEncoder;
