use std::sync::Arc;

use tracing::debug;

use crate::provider::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, ProviderError};

/// Reusable text completion capability: one provider plus the model and
/// token cap every request is sent with.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Complete a bare prompt with no system instructions.
    pub async fn complete(&self, prompt: &str) -> Result<ChatResponse, ProviderError> {
        self.complete_with_system("", prompt).await
    }

    pub async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<ChatResponse, ProviderError> {
        self.chat(system, vec![ChatMessage::user(prompt)]).await
    }

    /// Send a full message list (history replay).
    pub async fn chat(
        &self,
        system: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, ProviderError> {
        let req = ChatRequest {
            model: self.model.clone(),
            system: system.to_string(),
            messages,
            max_tokens: self.max_tokens,
        };
        debug!(
            model = %req.model,
            provider = %self.provider.name(),
            messages = req.messages.len(),
            "requesting completion"
        );
        self.provider.send(&req).await
    }
}
