use clap::Parser;
use tracing::info;
use tutorrag::cli::*;
use tutorrag::AppConfig;
use tutorrag::Result;
use tutorrag::TutorRag;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging; the guard flushes the file writer on exit
    let level = cli.verbose.then_some("debug");
    let _guard = tutorrag::logging::init_logging(&config.logging, level)?;
    info!("Configuration loaded successfully");

    if let Commands::Config = cli.command {
        handle_config_command(&config);
        return Ok(());
    }

    let app = TutorRag::build(&config).await?;

    // Execute the requested command
    match cli.command {
        Commands::Serve {
            host,
            port,
            no_cors,
        } => {
            handle_serve_command(&app, host, port, no_cors).await?;
        }
        Commands::Index { target } => {
            handle_index_command(&app, &target).await?;
        }
        Commands::Search {
            query,
            collection,
            top_k,
            threshold,
        } => {
            handle_search_command(&app, &query, collection, top_k, threshold).await?;
        }
        Commands::Ask {
            prompt,
            collection,
            top_k,
            ungrounded,
        } => {
            handle_ask_command(&app, &prompt, collection, top_k, ungrounded).await?;
        }
        Commands::Status => {
            handle_status_command(&app).await?;
        }
        Commands::Clear { name, force } => {
            handle_clear_command(&app, &name, force).await?;
        }
        Commands::Config => handle_config_command(&config),
    }

    Ok(())
}
