//! CLI command handlers

use std::io::BufRead;

use crate::cli::output::*;
use crate::models::Category;
use crate::rag::pipeline::ALL_COLLECTIONS;
use crate::AppConfig;
use crate::Result;
use crate::TutorRag;

/// Handle serve command
pub async fn handle_serve_command(
    app: &TutorRag,
    host: Option<String>,
    port: Option<u16>,
    no_cors: bool,
) -> Result<()> {
    let server = &app.config.server;
    let host = host.unwrap_or_else(|| server.host.clone());
    let port = port.unwrap_or(server.port);
    let cors = server.enable_cors && !no_cors;

    println!("🚀 Starting tutorrag API Server");
    println!("===============================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    println!();

    crate::api::serve_api(app, &host, port, cors).await
}

/// Handle index command
pub async fn handle_index_command(app: &TutorRag, target: &str) -> Result<()> {
    if target.eq_ignore_ascii_case(ALL_COLLECTIONS) {
        print_info("Indexing every category...");
        let summary = app.indexer.index_all().await;
        print_indexing_summary(&summary);
        return Ok(());
    }

    let category: Category = target.parse()?;
    print_info(&format!("Indexing {category}..."));
    let result = app.indexer.index_category(category).await;
    print_indexing_result(&result);
    Ok(())
}

/// Handle search command
pub async fn handle_search_command(
    app: &TutorRag,
    query: &str,
    collection: Option<String>,
    top_k: Option<usize>,
    threshold: Option<f32>,
) -> Result<()> {
    print_search_header(query, collection.as_deref().unwrap_or(ALL_COLLECTIONS));
    let results = app
        .rag
        .search(query, collection.as_deref(), top_k, threshold)
        .await?;
    print_search_results(&results);
    Ok(())
}

/// Handle ask command
pub async fn handle_ask_command(
    app: &TutorRag,
    prompt: &str,
    collection: Option<String>,
    top_k: Option<usize>,
    ungrounded: bool,
) -> Result<()> {
    if ungrounded {
        println!("{}", app.rag.ask_ungrounded(prompt).await);
        return Ok(());
    }

    let answer = app.rag.chat(prompt, collection.as_deref(), top_k).await;
    println!("{}", answer.response);
    println!();
    println!(
        "📎 Sources from {} (top_k={})",
        answer.collection_used, answer.top_k
    );
    print!(
        "{}",
        app.rag.context_assembler().create_summary(&answer.sources)
    );
    Ok(())
}

/// Handle status command
pub async fn handle_status_command(app: &TutorRag) -> Result<()> {
    let collections = app.indexer.status().await;
    print_collection_status(&collections);
    Ok(())
}

/// Handle clear command
pub async fn handle_clear_command(app: &TutorRag, name: &str, force: bool) -> Result<()> {
    if !force {
        print_warning(&format!("This will remove every document from '{name}'."));
        print_prompt("Continue? [y/N]: ");
        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            print_info("Aborted");
            return Ok(());
        }
    }

    if name.eq_ignore_ascii_case(ALL_COLLECTIONS) {
        app.reset().await?;
        print_success("Cleared every collection");
        return Ok(());
    }

    let ack = app.indexer.clear_collection(name).await?;
    print_success(&format!(
        "Removed {} document(s) from {}",
        ack.removed, ack.collection
    ));
    Ok(())
}

/// Handle config command
pub fn handle_config_command(config: &AppConfig) {
    print_config(config);
}
