//! CLI output formatting utilities

use crate::models::CollectionInfo;
use crate::models::IndexingResult;
use crate::models::IndexingStatus;
use crate::models::IndexingSummary;
use crate::models::SearchResult;
use crate::AppConfig;

/// Truncate at a character boundary, appending "..." when shortened
///
/// Korean text is multi-byte, so byte slicing would panic.
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

pub fn print_search_header(query: &str, collection: &str) {
    println!("🔍 Searching for: '{query}' in {collection}");
    println!();
}

pub fn print_search_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matching documents found.");
        return;
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. [{}] {} (similarity: {:.4})",
            i + 1,
            result.source_collection,
            result.id,
            result.similarity()
        );
        println!("   {}", truncate_str(&result.document_text.replace('\n', " "), 120));
    }
    println!();
    println!("📊 Found {} result(s)", results.len());
}

pub fn print_indexing_result(result: &IndexingResult) {
    match result.status {
        IndexingStatus::Success if result.failed_batches == 0 => print_success(&format!(
            "{}: indexed {}/{} documents",
            result.collection, result.indexed_count, result.total_documents
        )),
        IndexingStatus::Success => print_warning(&format!(
            "{}: indexed {}/{} documents, {} batch(es) failed",
            result.collection, result.indexed_count, result.total_documents, result.failed_batches
        )),
        IndexingStatus::Error => {
            print_error(&format!("{}: {}", result.collection, result.message));
        }
    }
}

pub fn print_indexing_summary(summary: &IndexingSummary) {
    println!(
        "📚 Indexed {}/{} collections",
        summary.successful_collections, summary.total_collections
    );
    let mut results: Vec<_> = summary.results.values().collect();
    results.sort_by(|a, b| a.collection.cmp(&b.collection));
    for result in results {
        print_indexing_result(result);
    }
    let elapsed = summary.finished_at - summary.started_at;
    println!("⏱️  Took {:.2}s", elapsed.num_milliseconds() as f64 / 1000.0);
}

pub fn print_collection_status(collections: &[CollectionInfo]) {
    println!("📦 Collections:");
    for info in collections {
        let category = info
            .metadata
            .get("category")
            .map_or_else(|| "-".to_string(), ToString::to_string);
        println!("  {:<24} {:>8} documents  ({category})", info.name, info.count);
    }
    let total: usize = collections.iter().map(|c| c.count).sum();
    println!();
    println!("📊 Total: {total} documents");
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 tutorrag Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory);
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {:?}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Key: {}", mask_key(&config.embeddings.api_key));
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!("  Batch size: {}", config.embeddings.batch_size);
    println!("  Local workers: {}", config.embeddings.max_workers);
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Key: {}", mask_key(&config.llm.llm_key));
    println!("  Model: {}", config.llm_model());
    println!("  Max tokens: {}", config.llm.max_tokens);
    println!("  Temperature: {}", config.llm.temperature);
    println!();

    println!("🗄️  Vector store:");
    match &config.vector_store.persist_directory {
        Some(dir) => println!("  Persist directory: {}", dir.display()),
        None => println!("  Persist directory: (in-memory)"),
    }
    println!();

    println!("📚 Indexing:");
    println!("  Data directory: {}", config.indexing.data_directory.display());
    println!("  Batch size: {}", config.indexing.batch_size);
    println!(
        "  Chunking: {} chars, {} overlap",
        config.indexing.chunk_size, config.indexing.chunk_overlap
    );
    println!("  Auto-index on startup: {}", config.indexing.auto_index_on_startup);
    println!();

    println!("🔍 Retrieval:");
    println!("  Default top_k: {}", config.retrieval.default_top_k);
    println!("  Chat top_k: {}", config.retrieval.chat_top_k);
    println!("  Max top_k: {}", config.retrieval.max_top_k);
    println!("  Threshold: {:?}", config.retrieval.similarity_threshold);
    println!("  Collections: {}", config.retrieval.default_collections.join(", "));
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
}

/// Keep only the last four characters of an API key
fn mask_key(key: &str) -> String {
    let count = key.chars().count();
    if count == 0 {
        "(not set)".to_string()
    } else if count <= 4 {
        "****".to_string()
    } else {
        let tail: String = key.chars().skip(count - 4).collect();
        format!("****{tail}")
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}

pub fn print_prompt(msg: &str) {
    print!("{msg}");
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("안녕하세요", 2), "안녕...");
        assert_eq!(truncate_str("안녕", 2), "안녕");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("abc"), "****");
        assert_eq!(mask_key("sk-123456"), "****3456");
    }
}
