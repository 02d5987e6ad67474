use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use robin_agent::failover::{FailoverProvider, ProviderSlot};
use robin_agent::ollama::OllamaProvider;
use robin_agent::provider::{LlmProvider, ProviderError};
use robin_agent::{
    CompletionClient, CompletionReplier, ConversationHistory, HistoryContextExtractor,
    KeywordClassifier, ReplyStrategies, Robin, RuleFollowUpDecider,
};
use robin_core::config::RobinConfig;

/// Everything a command needs: the router plus the history it reads from.
pub struct App {
    pub robin: Robin,
    pub history: Arc<ConversationHistory>,
}

impl App {
    pub fn build(config: &RobinConfig) -> Result<Self, ProviderError> {
        let provider = build_provider(config)?;
        let client = CompletionClient::new(
            provider,
            config.completion.model.clone(),
            config.completion.max_tokens,
        );
        let replier = Arc::new(CompletionReplier::new(client));

        let history = Arc::new(ConversationHistory::new(config.history.max_turns));
        let robin = Robin::new(
            Arc::new(KeywordClassifier::new(&config.classifier)),
            Arc::new(HistoryContextExtractor::new(
                Arc::clone(&history),
                config.history.context_turns,
            )),
            ReplyStrategies {
                contextual: replier.clone(),
                investigation: replier.clone(),
                direct: replier,
            },
            Arc::new(RuleFollowUpDecider::new(&config.follow_up)),
        );

        Ok(Self { robin, history })
    }
}

/// Ollama for the configured model, then one slot per fallback model.
/// A single slot without retries skips the failover wrapper.
pub fn build_provider(config: &RobinConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let completion = &config.completion;
    let base_url = config.providers.ollama.base_url.clone();
    let timeout = Duration::from_secs(completion.timeout_secs);

    let primary = OllamaProvider::new(Some(base_url.clone()), timeout)?;
    info!(
        "LLM provider slot[0]: Ollama {} ({}, timeout {}s)",
        completion.model, base_url, completion.timeout_secs
    );

    if completion.fallback_models.is_empty() && completion.max_retries == 0 {
        return Ok(Arc::new(primary));
    }

    let mut slots = vec![ProviderSlot::new(Box::new(primary), completion.max_retries)];
    for model in &completion.fallback_models {
        info!("LLM provider slot[{}]: Ollama {} ({})", slots.len(), model, base_url);
        slots.push(
            ProviderSlot::new(
                Box::new(OllamaProvider::new(Some(base_url.clone()), timeout)?),
                completion.max_retries,
            )
            .with_model(model.clone()),
        );
    }

    match FailoverProvider::new(slots) {
        Some(chain) => Ok(Arc::new(chain)),
        None => Err(ProviderError::Unavailable("no provider configured".to_string())),
    }
}
