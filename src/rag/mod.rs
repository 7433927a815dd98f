//! RAG (Retrieval-Augmented Generation) module
//!
//! - Query embedding and fan-out search over the category collections
//! - Cross-collection ranking, threshold filtering and truncation
//! - Context assembly from ranked passages
//! - Persona-grounded generation that degrades to an apology on failure
//!
//! # Examples
//!
//! ```rust,no_run
//! use tutorrag::config::AppConfig;
//! use tutorrag::TutorRag;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let app = TutorRag::build(&config).await?;
//!
//!     let answer = app.rag.chat("가르치다는 무슨 뜻이에요?", None, None).await;
//!     println!("Answer: {}", answer.response);
//!     println!("Sources: {} passages", answer.sources.len());
//!
//!     Ok(())
//! }
//! ```

pub mod composer;
pub mod context;
pub mod pipeline;
pub mod prompts;
pub mod retriever;

pub use composer::AnswerComposer;
pub use context::ContextAssembler;
pub use pipeline::ChatAnswer;
pub use pipeline::RagService;
pub use retriever::Retriever;
