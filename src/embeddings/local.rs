//! In-process embedding on a bounded blocking worker pool

use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use tokio::sync::Semaphore;
use twox_hash::XxHash64;

use crate::errors::Result;
use crate::errors::TutorRagError;

/// Synchronous, CPU-bound text encoder
pub trait TextEncoder: Send + Sync {
    /// Encode every text into a vector of `dimension()` floats, in input order
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

const TOKEN_SEED: u64 = 0;
const NGRAM_SEED: u64 = 1;
const NGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing encoder over whitespace tokens and
/// character n-grams. Output is L2-normalised; empty text maps to the zero
/// vector.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dimension: usize,
    ngram: usize,
}

impl HashingEncoder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension, ngram: 3 }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, seed: u64, weight: f32) {
        let mut hasher = XxHash64::with_seed(seed);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dimension as u64) as usize;
        // high bit picks the sign so collisions tend to cancel
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign * weight;
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimension];
        let lowered = text.to_lowercase();

        for token in lowered.split_whitespace() {
            self.add_feature(&mut vector, token, TOKEN_SEED, 1.0);

            let chars: Vec<char> = token.chars().collect();
            if self.ngram > 0 && chars.len() > self.ngram {
                for window in chars.windows(self.ngram) {
                    let gram: String = window.iter().collect();
                    self.add_feature(&mut vector, &gram, NGRAM_SEED, NGRAM_WEIGHT);
                }
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl TextEncoder for HashingEncoder {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.dimension == 0 {
            return Err(TutorRagError::ConfigError(
                "hashing encoder dimension must be > 0".to_string(),
            ));
        }
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Runs a [`TextEncoder`] on `spawn_blocking`, at most `max_workers` at a time
#[derive(Clone)]
pub struct LocalEmbedder {
    encoder: Arc<dyn TextEncoder>,
    workers: Arc<Semaphore>,
}

impl LocalEmbedder {
    pub fn new(encoder: Arc<dyn TextEncoder>, max_workers: usize) -> Self {
        Self {
            encoder,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.encoder.dimension()
    }

    /// Encode a batch off the async executor
    ///
    /// # Errors
    /// - Encoder failures
    /// - Worker pool shutdown or a panicked worker
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|e| TutorRagError::EmbeddingBackend {
                batch_index: 0,
                reason: format!("local worker pool closed: {e}"),
            })?;

        let encoder = Arc::clone(&self.encoder);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            encoder.encode(&texts)
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_hashing_encoder_is_deterministic() {
        let encoder = HashingEncoder::new(64);
        let a = encoder.encode(&["사과 세 개".to_string()]).unwrap();
        let b = encoder.encode(&["사과 세 개".to_string()]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 64);
    }

    #[test]
    fn test_hashing_encoder_normalises() {
        let encoder = HashingEncoder::new(128);
        let v = &encoder.encode(&["word: 사과 meaning: apple".to_string()]).unwrap()[0];
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let encoder = HashingEncoder::new(16);
        let v = encoder.encode(&[String::new()]).unwrap();
        assert_eq!(v[0], vec![0.0; 16]);
    }

    #[test]
    fn test_shared_tokens_are_closer() {
        let encoder = HashingEncoder::new(512);
        let out = encoder
            .encode(&[
                "apple banana".to_string(),
                "apple banana cherry".to_string(),
                "quantum chromodynamics".to_string(),
            ])
            .unwrap();
        assert!(cosine(&out[0], &out[1]) > cosine(&out[0], &out[2]));
    }

    #[tokio::test]
    async fn test_local_embedder_preserves_order() {
        let embedder = LocalEmbedder::new(Arc::new(HashingEncoder::new(32)), 2);
        let texts: Vec<String> = (0..5).map(|i| format!("text {i}")).collect();
        let out = embedder.embed_batch(&texts).await.unwrap();
        let direct = HashingEncoder::new(32).encode(&texts).unwrap();
        assert_eq!(out, direct);
    }
}
