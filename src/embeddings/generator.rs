//! Embedding service with batching and local fallback

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use tracing::info;
use tracing::warn;

use super::client::RemoteEmbeddingClient;
use super::local::HashingEncoder;
use super::local::LocalEmbedder;
use crate::config::EmbeddingProviderKind;
use crate::config::EmbeddingsConfig;
use crate::errors::Result;
use crate::errors::TutorRagError;

/// The backend serving the primary embedding path
pub enum EmbeddingBackend {
    Remote(RemoteEmbeddingClient),
    Local(LocalEmbedder),
}

impl EmbeddingBackend {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Remote(client) => client.embed_batch(texts).await,
            Self::Local(embedder) => embedder.embed_batch(texts).await,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EmbeddingProviderKind {
        match self {
            Self::Remote(_) => EmbeddingProviderKind::Remote,
            Self::Local(_) => EmbeddingProviderKind::Local,
        }
    }
}

/// Which path produced a batch's vectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Primary,
    Fallback { reason: String },
}

impl BatchOutcome {
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Vectors plus the per-batch path taken to produce them
#[derive(Debug, Clone, Default)]
pub struct EmbeddingReport {
    pub embeddings: Vec<Vec<f32>>,
    pub outcomes: Vec<BatchOutcome>,
}

/// Service for generating embeddings in order-preserving batches
pub struct EmbeddingService {
    primary: EmbeddingBackend,
    fallback: Option<LocalEmbedder>,
    batch_size: usize,
    rate_limit_delay: Duration,
    dimension: usize,
}

impl EmbeddingService {
    /// Assemble a service from explicit backends
    pub fn new(
        primary: EmbeddingBackend,
        fallback: Option<LocalEmbedder>,
        batch_size: usize,
        rate_limit_delay: Duration,
        dimension: usize,
    ) -> Self {
        Self {
            primary,
            fallback,
            batch_size: batch_size.max(1),
            rate_limit_delay,
            dimension,
        }
    }

    /// Build the configured backend. A remote provider without credentials
    /// degrades to the local encoder.
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        let local = LocalEmbedder::new(
            Arc::new(HashingEncoder::new(config.dimension)),
            config.max_workers,
        );
        let delay = Duration::from_millis(config.rate_limit_delay_ms);

        let service = match config.provider {
            EmbeddingProviderKind::Remote if config.api_key.trim().is_empty() => {
                warn!("Remote embeddings selected but no API key is set, using local encoder");
                Self::new(
                    EmbeddingBackend::Local(local),
                    None,
                    config.batch_size,
                    delay,
                    config.dimension,
                )
            }
            EmbeddingProviderKind::Remote => {
                let client = RemoteEmbeddingClient::new(
                    &config.endpoint,
                    &config.model,
                    &config.api_key,
                    config.request_timeout_secs,
                )?;
                info!("Using remote embeddings ({}) with local fallback", config.model);
                Self::new(
                    EmbeddingBackend::Remote(client),
                    Some(local),
                    config.batch_size,
                    delay,
                    config.dimension,
                )
            }
            EmbeddingProviderKind::Local => {
                info!("Using local hashing encoder (dimension {})", config.dimension);
                Self::new(
                    EmbeddingBackend::Local(local),
                    None,
                    config.batch_size,
                    delay,
                    config.dimension,
                )
            }
        };
        Ok(service)
    }

    /// Embed a single text
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_many(&[text.to_string()]).await?;
        embeddings.pop().ok_or_else(|| TutorRagError::EmbeddingBackend {
            batch_index: 0,
            reason: "backend returned no vector".to_string(),
        })
    }

    /// Embed many texts, preserving order and length
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.embed_many_with_report(texts).await?.embeddings)
    }

    /// Embed many texts and report which backend served each batch
    ///
    /// # Errors
    /// - `EmbeddingBackend` when a batch fails on the primary path and on fallback
    pub async fn embed_many_with_report(&self, texts: &[String]) -> Result<EmbeddingReport> {
        let mut report = EmbeddingReport {
            embeddings: Vec::with_capacity(texts.len()),
            outcomes: Vec::new(),
        };
        if texts.is_empty() {
            return Ok(report);
        }

        let total_batches = texts.len().div_ceil(self.batch_size);
        for (batch_index, chunk) in texts.chunks(self.batch_size).enumerate() {
            debug!(
                "Embedding batch {}/{} ({} texts)",
                batch_index + 1,
                total_batches,
                chunk.len()
            );

            let primary = self
                .primary
                .embed_batch(chunk)
                .await
                .and_then(|vectors| check_count(vectors, chunk.len()));

            let (vectors, outcome) = match primary {
                Ok(vectors) => (vectors, BatchOutcome::Primary),
                Err(e) => {
                    let reason = failure_reason(&e);
                    let Some(fallback) = &self.fallback else {
                        return Err(TutorRagError::EmbeddingBackend {
                            batch_index,
                            reason,
                        });
                    };
                    warn!(
                        "Embedding batch {} failed on primary backend, retrying locally: {}",
                        batch_index, reason
                    );
                    let vectors = fallback
                        .embed_batch(chunk)
                        .await
                        .and_then(|vectors| check_count(vectors, chunk.len()))
                        .map_err(|fe| TutorRagError::EmbeddingBackend {
                            batch_index,
                            reason: format!("{reason}; fallback: {}", failure_reason(&fe)),
                        })?;
                    (vectors, BatchOutcome::Fallback { reason })
                }
            };

            report.embeddings.extend(vectors);
            report.outcomes.push(outcome);

            let more_batches = batch_index + 1 < total_batches;
            if more_batches && matches!(self.primary, EmbeddingBackend::Remote(_)) {
                tokio::time::sleep(self.rate_limit_delay).await;
            }
        }

        Ok(report)
    }

    /// Get the embedding dimension
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub const fn provider(&self) -> EmbeddingProviderKind {
        self.primary.kind()
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }
}

fn check_count(vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if vectors.len() == expected {
        Ok(vectors)
    } else {
        Err(TutorRagError::EmbeddingBackend {
            batch_index: 0,
            reason: format!("expected {expected} vectors, got {}", vectors.len()),
        })
    }
}

fn failure_reason(error: &TutorRagError) -> String {
    match error {
        TutorRagError::EmbeddingBackend { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TextEncoder;

    struct FailingEncoder;

    impl TextEncoder for FailingEncoder {
        fn encode(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(TutorRagError::EmbeddingBackend {
                batch_index: 0,
                reason: "encoder offline".to_string(),
            })
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    fn local_service(batch_size: usize) -> EmbeddingService {
        let local = LocalEmbedder::new(Arc::new(HashingEncoder::new(16)), 2);
        EmbeddingService::new(
            EmbeddingBackend::Local(local),
            None,
            batch_size,
            Duration::ZERO,
            16,
        )
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("문장 {i}")).collect()
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty() {
        let service = local_service(3);
        assert!(service.embed_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batching_preserves_order() {
        let service = local_service(3);
        let input = texts(7);
        let report = service.embed_many_with_report(&input).await.unwrap();
        assert_eq!(report.embeddings.len(), 7);
        assert_eq!(report.outcomes.len(), 3);

        let direct = HashingEncoder::new(16).encode(&input).unwrap();
        assert_eq!(report.embeddings, direct);
    }

    #[tokio::test]
    async fn test_embed_one_matches_batch() {
        let service = local_service(50);
        let one = service.embed_one("hello").await.unwrap();
        let many = service.embed_many(&["hello".to_string()]).await.unwrap();
        assert_eq!(one, many[0]);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_per_batch() {
        let remote = RemoteEmbeddingClient::new("http://127.0.0.1:9", "m", "k", 2).unwrap();
        let local = LocalEmbedder::new(Arc::new(HashingEncoder::new(16)), 2);
        let service = EmbeddingService::new(
            EmbeddingBackend::Remote(remote),
            Some(local),
            2,
            Duration::ZERO,
            16,
        );

        let report = service.embed_many_with_report(&texts(3)).await.unwrap();
        assert_eq!(report.embeddings.len(), 3);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes.iter().all(BatchOutcome::is_fallback));
    }

    #[tokio::test]
    async fn test_exhausted_fallback_reports_batch_index() {
        let remote = RemoteEmbeddingClient::new("http://127.0.0.1:9", "m", "k", 2).unwrap();
        let broken = LocalEmbedder::new(Arc::new(FailingEncoder), 1);
        let service = EmbeddingService::new(
            EmbeddingBackend::Remote(remote),
            Some(broken),
            2,
            Duration::ZERO,
            8,
        );

        let err = service.embed_many(&texts(3)).await.unwrap_err();
        match err {
            TutorRagError::EmbeddingBackend { batch_index, reason } => {
                assert_eq!(batch_index, 0);
                assert!(reason.contains("encoder offline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_local_primary_without_fallback_fails() {
        let broken = LocalEmbedder::new(Arc::new(FailingEncoder), 1);
        let service =
            EmbeddingService::new(EmbeddingBackend::Local(broken), None, 10, Duration::ZERO, 8);
        assert!(service.embed_one("x").await.is_err());
    }

    #[test]
    fn test_remote_without_key_degrades_to_local() {
        let config = EmbeddingsConfig {
            provider: EmbeddingProviderKind::Remote,
            api_key: String::new(),
            ..EmbeddingsConfig::default()
        };
        let service = EmbeddingService::from_config(&config).unwrap();
        assert_eq!(service.provider(), EmbeddingProviderKind::Local);
    }
}
