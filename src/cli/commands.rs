//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "tutorrag")]
#[command(about = "Korean tutoring RAG: index exercise material and answer grounded questions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Disable CORS even if the config enables it
        #[arg(long)]
        no_cors: bool,
    },
    /// Index source material into the vector store
    Index {
        /// Category or collection name, or "all"
        #[arg(default_value = "all")]
        target: String,
    },
    /// Similarity search without generation
    Search {
        /// Search text
        query: String,
        /// Restrict to one collection ("all" searches the defaults)
        #[arg(short, long)]
        collection: Option<String>,
        /// Number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Minimum similarity (1 - cosine distance) to keep
        #[arg(short, long)]
        threshold: Option<f32>,
    },
    /// Ask the tutor a question
    Ask {
        /// The question
        prompt: String,
        /// Restrict retrieval to one collection
        #[arg(short, long)]
        collection: Option<String>,
        /// Number of passages to ground on
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Skip retrieval and send the prompt straight to the model
        #[arg(long)]
        ungrounded: bool,
    },
    /// Show document counts per collection
    Status,
    /// Remove every document from a collection ("all" clears every collection)
    Clear {
        /// Collection name, or "all"
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Config,
}
