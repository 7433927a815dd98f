//! OpenAI-compatible embeddings client

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::TutorRagError;

/// Client for a remote `/embeddings` endpoint
pub struct RemoteEmbeddingClient {
    model: String,
    endpoint: String,
    api_key: String,
    client: Client,
}

impl RemoteEmbeddingClient {
    /// Create a new remote client
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(endpoint: &str, model: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TutorRagError::HttpError(e.to_string()))?;

        Ok(Self {
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed one batch, returning vectors in input order
    ///
    /// # Errors
    /// - Network errors, timeouts, authentication failures
    /// - Malformed responses or a vector count that differs from the input
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            input: Vec<String>,
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct EmbeddingResponse {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
            #[serde(default)]
            index: Option<usize>,
        }

        let url = format!("{}/embeddings", self.endpoint);
        debug!("Calling embeddings API: {} ({} items)", url, texts.len());

        let request = EmbeddingRequest {
            input: texts.iter().map(|t| prepare_input(t)).collect(),
            model: &self.model,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TutorRagError::HttpError(format!(
                "embeddings API error ({status}): {error_text}"
            )));
        }

        let mut result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| TutorRagError::HttpError(format!("Failed to parse response: {e}")))?;

        if result.data.len() != texts.len() {
            return Err(TutorRagError::HttpError(format!(
                "embeddings API returned {} vectors for {} inputs",
                result.data.len(),
                texts.len()
            )));
        }

        if result.data.iter().all(|d| d.index.is_some()) {
            result.data.sort_by_key(|d| d.index);
        }

        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Newlines degrade remote embedding quality and empty inputs are rejected,
/// so both are normalised before sending.
fn prepare_input(text: &str) -> String {
    let flattened = text.replace(['\n', '\r'], " ");
    if flattened.trim().is_empty() {
        " ".to_string()
    } else {
        flattened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_input_flattens_newlines() {
        assert_eq!(prepare_input("a\nb\r\nc"), "a b  c");
    }

    #[test]
    fn test_prepare_input_keeps_empty_embeddable() {
        assert_eq!(prepare_input(""), " ");
        assert_eq!(prepare_input("\n"), " ");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let client = RemoteEmbeddingClient::new("http://127.0.0.1:9", "m", "k", 2).unwrap();
        let err = client.embed_batch(&["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, TutorRagError::HttpError(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let client = RemoteEmbeddingClient::new("http://127.0.0.1:9", "m", "k", 2).unwrap();
        assert!(client.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "Requires API key"]
    async fn test_openai_embedding() {
        let client = RemoteEmbeddingClient::new(
            "https://api.openai.com/v1",
            "text-embedding-ada-002",
            &std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            60,
        )
        .unwrap();

        let embeddings = client.embed_batch(&["안녕하세요".to_string()]).await.unwrap();
        assert_eq!(embeddings[0].len(), 1536);
    }
}
