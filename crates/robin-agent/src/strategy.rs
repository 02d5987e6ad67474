use async_trait::async_trait;
use tracing::debug;

use robin_core::{Context, Message, Reply, Result, RobinError};

use crate::completion::CompletionClient;
use crate::prompt::{system_prompt, user_prompt, PromptKind};
use crate::provider::ProviderError;

/// Reply strategy for automated investigation: answers from extracted context.
#[async_trait]
pub trait ContextualReplier: Send + Sync {
    async fn generate_with_context(&self, message: &Message, context: &Context) -> Result<Reply>;
}

/// Reply strategy for investigation without automatable context. Typically
/// defers, asks a clarifying question, or flags the request for a human.
#[async_trait]
pub trait InvestigationReplier: Send + Sync {
    async fn generate_without_context(&self, message: &Message) -> Result<Reply>;
}

/// Reply strategy for messages that need no investigation.
#[async_trait]
pub trait DirectResponder: Send + Sync {
    async fn generate_response(&self, message: &Message) -> Result<Reply>;
}

/// All three strategies on top of one text completion capability, each with
/// its own system prompt.
pub struct CompletionReplier {
    client: CompletionClient,
}

impl CompletionReplier {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    async fn generate(
        &self,
        kind: PromptKind,
        message: &Message,
        context: Option<&Context>,
    ) -> Result<Reply> {
        let system = system_prompt(kind, context);
        let resp = self
            .client
            .complete_with_system(&system, &user_prompt(message))
            .await
            .map_err(generation_failed)?;

        debug!(
            kind = ?kind,
            model = %resp.model,
            tokens_in = resp.tokens_in,
            tokens_out = resp.tokens_out,
            "strategy completion done"
        );

        let text = resp.content.trim();
        if text.is_empty() {
            return Ok(Reply::deferral("the model returned no answer"));
        }
        Ok(Reply::new(text))
    }
}

fn generation_failed(e: ProviderError) -> RobinError {
    RobinError::GenerationFailed(e.to_string())
}

#[async_trait]
impl ContextualReplier for CompletionReplier {
    async fn generate_with_context(&self, message: &Message, context: &Context) -> Result<Reply> {
        self.generate(PromptKind::Contextual, message, Some(context))
            .await
    }
}

#[async_trait]
impl InvestigationReplier for CompletionReplier {
    async fn generate_without_context(&self, message: &Message) -> Result<Reply> {
        self.generate(PromptKind::Investigation, message, None).await
    }
}

#[async_trait]
impl DirectResponder for CompletionReplier {
    async fn generate_response(&self, message: &Message) -> Result<Reply> {
        self.generate(PromptKind::Direct, message, None).await
    }
}
