//! Grounded answer generation with a fail-soft contract

use std::sync::Arc;

use tracing::debug;
use tracing::error;

use crate::errors::Result;
use crate::llm::ChatBackend;
use crate::llm::ChatMessage;
use crate::llm::GenerationParams;
use crate::rag::prompts::build_apology;
use crate::rag::prompts::build_grounded_prompt;
use crate::rag::prompts::TUTOR_PERSONA;

pub struct AnswerComposer {
    backend: Arc<dyn ChatBackend>,
    params: GenerationParams,
}

impl AnswerComposer {
    pub fn new(backend: Arc<dyn ChatBackend>, params: GenerationParams) -> Self {
        Self { backend, params }
    }

    /// One generation call with the persona and the reference block.
    /// Never fails: a backend error becomes an apology that embeds it.
    pub async fn compose(&self, prompt: &str, context: &str) -> String {
        self.try_compose(prompt, context)
            .await
            .unwrap_or_else(|e| {
                error!("Grounded generation failed: {}", e);
                build_apology(&e.to_string())
            })
    }

    /// As [`compose`](Self::compose), but surfaces the backend error
    pub async fn try_compose(&self, prompt: &str, context: &str) -> Result<String> {
        debug!("Composing grounded answer ({} context chars)", context.len());
        let messages = [
            ChatMessage::system(TUTOR_PERSONA),
            ChatMessage::user(build_grounded_prompt(prompt, context)),
        ];
        self.backend.chat(&messages, self.params).await
    }

    /// Persona and question only, no retrieval
    pub async fn compose_ungrounded(&self, prompt: &str) -> String {
        let messages = [ChatMessage::system(TUTOR_PERSONA), ChatMessage::user(prompt)];
        match self.backend.chat(&messages, self.params).await {
            Ok(text) => text,
            Err(e) => {
                error!("Ungrounded generation failed: {}", e);
                build_apology(&e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::errors::TutorRagError;
    use crate::rag::prompts::APOLOGY_MARKER;

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatBackend for RecordingBackend {
        async fn chat(&self, messages: &[ChatMessage], _params: GenerationParams) -> Result<String> {
            self.calls.lock().unwrap().push(messages.to_vec());
            Ok("답변".to_string())
        }
    }

    struct DownBackend;

    #[async_trait]
    impl ChatBackend for DownBackend {
        async fn chat(&self, _messages: &[ChatMessage], _params: GenerationParams) -> Result<String> {
            Err(TutorRagError::GenerationBackend("quota exceeded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_compose_sends_persona_and_grounded_turn() {
        let backend = Arc::new(RecordingBackend::default());
        let composer = AnswerComposer::new(backend.clone(), GenerationParams::default());

        let answer = composer.compose("뜻이 뭐예요?", "1. 자료").await;
        assert_eq!(answer, "답변");

        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], ChatMessage::system(TUTOR_PERSONA));
        assert_eq!(calls[0][1].content, "참고 자료:\n1. 자료\n\n질문: 뜻이 뭐예요?");
    }

    #[tokio::test]
    async fn test_compose_fails_soft() {
        let composer = AnswerComposer::new(Arc::new(DownBackend), GenerationParams::default());
        let answer = composer.compose("q", "c").await;
        assert!(answer.contains(APOLOGY_MARKER));
        assert!(answer.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_try_compose_surfaces_error() {
        let composer = AnswerComposer::new(Arc::new(DownBackend), GenerationParams::default());
        assert!(composer.try_compose("q", "c").await.is_err());
    }

    #[tokio::test]
    async fn test_ungrounded_skips_reference_block() {
        let backend = Arc::new(RecordingBackend::default());
        let composer = AnswerComposer::new(backend.clone(), GenerationParams::default());
        composer.compose_ungrounded("안녕").await;
        let calls = backend.calls.lock().unwrap();
        assert_eq!(calls[0][1].content, "안녕");

        let down = AnswerComposer::new(Arc::new(DownBackend), GenerationParams::default());
        assert!(down.compose_ungrounded("안녕").await.starts_with(APOLOGY_MARKER));
    }
}
