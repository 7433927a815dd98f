//! Line-packed splitter for plain reference text

use sha2::Digest;
use sha2::Sha256;

use crate::models::Metadata;
use crate::models::TextChunk;

/// Packs whole lines into chunks of at most `chunk_size` characters and
/// seeds each new chunk with the last `chunk_overlap` characters of the
/// previous one. Lines longer than a chunk are hard-split.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(
            crate::config::default_chunk_size(),
            crate::config::default_chunk_overlap(),
        )
    }
}

impl TextChunker {
    #[must_use]
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Split text into trimmed, non-empty chunks
    #[must_use]
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for line in text.lines().flat_map(|l| self.hard_split(l)) {
            let line_len = line.chars().count();
            let joined_len = if current.is_empty() {
                line_len
            } else {
                current_len + 1 + line_len
            };

            if joined_len <= self.chunk_size {
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(&line);
                current_len = joined_len;
                continue;
            }

            let trimmed = current.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            // keep the seeded chunk within chunk_size
            let room = self.chunk_size.saturating_sub(line_len + 1);
            let overlap = self.chunk_overlap.min(room);
            if !chunks.is_empty() && overlap > 0 {
                let tail = tail_chars(&current, overlap);
                current = format!("{tail}\n{line}");
                current_len = tail.chars().count() + 1 + line_len;
            } else {
                current = line;
                current_len = line_len;
            }
        }

        let trimmed = current.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        chunks
    }

    /// Chunk a named text into `{stem}_{i}` records
    #[must_use]
    pub fn chunk_document(&self, stem: &str, text: &str) -> Vec<TextChunk> {
        self.split_text(text)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut metadata = Metadata::new();
                metadata.insert("source".to_string(), stem.into());
                metadata.insert("chunk_index".to_string(), i.into());
                metadata.insert("content_hash".to_string(), content_hash(&chunk).into());
                TextChunk {
                    id: Some(format!("{stem}_{i}")),
                    text: Some(chunk),
                    metadata,
                }
            })
            .collect()
    }

    fn hard_split(&self, line: &str) -> Vec<String> {
        if line.chars().count() <= self.chunk_size {
            return vec![line.to_string()];
        }
        let chars: Vec<char> = line.chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|c| c.iter().collect())
            .collect()
    }
}

fn tail_chars(text: &str, n: usize) -> String {
    let count = text.chars().count();
    text.chars().skip(count.saturating_sub(n)).collect()
}

/// First 16 hex chars of the SHA-256 of `text`
#[must_use]
pub fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(16);
    hash
}
