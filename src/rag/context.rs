//! Context assembly from retrieved documents

use crate::cli::output::truncate_str;
use crate::models::SearchResult;
use crate::rag::prompts::NO_REFERENCE_SENTINEL;

/// Renders ranked results into the reference block of a prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler;

impl ContextAssembler {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// One line per result in ranked order; never empty
    #[must_use]
    pub fn build_context(&self, results: &[SearchResult]) -> String {
        if results.is_empty() {
            return NO_REFERENCE_SENTINEL.to_string();
        }

        results
            .iter()
            .enumerate()
            .map(|(idx, result)| {
                format!(
                    "{}. [{}] similarity={:.4} - {}",
                    idx + 1,
                    result.source_collection,
                    result.similarity(),
                    flatten(&result.document_text)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Short human-readable listing of results
    #[must_use]
    pub fn create_summary(&self, results: &[SearchResult]) -> String {
        if results.is_empty() {
            return "No documents found.".to_string();
        }

        let mut summary = format!("Found {} relevant document(s):\n\n", results.len());
        for (idx, result) in results.iter().enumerate() {
            summary.push_str(&format!(
                "{}. [{}] {} - similarity {:.4}\n   {}\n\n",
                idx + 1,
                result.source_collection,
                result.id,
                result.similarity(),
                truncate_str(&flatten(&result.document_text), 100)
            ));
        }
        summary
    }
}

/// Multi-line chunks would break the one-line-per-result layout
fn flatten(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;

    fn hit(text: &str, collection: &str, distance: f32) -> SearchResult {
        SearchResult {
            id: text.to_string(),
            document_text: text.to_string(),
            metadata: Metadata::new(),
            distance,
            source_collection: collection.to_string(),
        }
    }

    #[test]
    fn test_empty_results_give_sentinel() {
        assert_eq!(ContextAssembler::new().build_context(&[]), NO_REFERENCE_SENTINEL);
    }

    #[test]
    fn test_one_line_per_result_in_order() {
        let results = vec![
            hit("가르치다", "card_check", 0.1),
            hit("문제\n둘째 줄", "korean_word_problems", 0.25),
        ];
        let context = ContextAssembler::new().build_context(&results);
        let lines: Vec<_> = context.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "1. [card_check] similarity=0.9000 - 가르치다");
        assert_eq!(lines[1], "2. [korean_word_problems] similarity=0.7500 - 문제 둘째 줄");
    }

    #[test]
    fn test_summary_mentions_every_result() {
        let results = vec![hit("a", "card_check", 0.0), hit("b", "pdf_documents", 0.5)];
        let summary = ContextAssembler::new().create_summary(&results);
        assert!(summary.starts_with("Found 2 relevant document(s)"));
        assert!(summary.contains("[pdf_documents] b"));
    }
}
