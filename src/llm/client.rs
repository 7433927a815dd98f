//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::ChatBackend;
use super::ChatMessage;
use super::GenerationParams;
use crate::config::LlmConfig;
use crate::errors::Result;
use crate::errors::TutorRagError;

pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmService {
    /// Create a new client from the `[llm]` section
    ///
    /// # Errors
    /// - HTTP client build errors (invalid configuration)
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TutorRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm_key.clone(),
            model: config.llm_model.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: usize,
    temperature: f32,
}

#[async_trait]
impl ChatBackend for LlmService {
    async fn chat(&self, messages: &[ChatMessage], params: GenerationParams) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions API: {} ({} messages)", url, messages.len());

        let body = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TutorRagError::GenerationBackend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(TutorRagError::GenerationBackend(format!(
                "chat API error ({status}): {error_text}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| TutorRagError::GenerationBackend(format!("Failed to parse response: {e}")))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                TutorRagError::GenerationBackend("response has no choices[0].message.content".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> LlmConfig {
        LlmConfig {
            llm_endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_request_serialisation() {
        let messages = [ChatMessage::system("persona"), ChatMessage::user("질문")];
        let body = CompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
            max_tokens: 500,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "질문");
        assert_eq!(json["max_tokens"], 500);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_generation_error() {
        let llm = LlmService::new(&unreachable_config()).unwrap();
        let err = llm
            .chat(&[ChatMessage::user("hi")], GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TutorRagError::GenerationBackend(_)));
    }
}
