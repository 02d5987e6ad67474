use async_trait::async_trait;
use tracing::{info, warn};

use crate::provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};

/// One entry in the failover chain.
pub struct ProviderSlot {
    pub provider: Box<dyn LlmProvider>,
    /// Extra attempts on this provider before moving to the next one.
    pub max_retries: u32,
    /// Replaces `ChatRequest::model` for requests sent to this slot.
    pub model: Option<String>,
}

impl ProviderSlot {
    pub fn new(provider: Box<dyn LlmProvider>, max_retries: u32) -> Self {
        Self {
            provider,
            max_retries,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Tries provider slots in priority order (index 0 first).
///
/// A slot is abandoned after `max_retries` extra attempts, or immediately on
/// a rate-limit error. The last error is returned when every slot fails.
pub struct FailoverProvider {
    slots: Vec<ProviderSlot>,
}

impl FailoverProvider {
    /// Returns `None` for an empty slot list.
    pub fn new(slots: Vec<ProviderSlot>) -> Option<Self> {
        if slots.is_empty() {
            None
        } else {
            Some(Self { slots })
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl LlmProvider for FailoverProvider {
    fn name(&self) -> &str {
        "failover"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut last_err: Option<ProviderError> = None;

        for slot in &self.slots {
            let provider_name = slot.provider.name();
            let slot_req;
            let req = match &slot.model {
                Some(model) => {
                    slot_req = ChatRequest {
                        model: model.clone(),
                        ..req.clone()
                    };
                    &slot_req
                }
                None => req,
            };

            for attempt in 0..=slot.max_retries {
                match slot.provider.send(req).await {
                    Ok(resp) => {
                        if attempt > 0 {
                            info!(
                                provider = %provider_name,
                                model = %req.model,
                                attempt,
                                "request succeeded after retry"
                            );
                        }
                        return Ok(resp);
                    }
                    Err(e) => {
                        warn!(
                            provider = %provider_name,
                            model = %req.model,
                            attempt,
                            err = %e,
                            "provider send failed"
                        );

                        let rate_limited = matches!(e, ProviderError::RateLimited { .. });
                        last_err = Some(e);
                        if rate_limited {
                            break;
                        }

                        if attempt < slot.max_retries {
                            tokio::time::sleep(tokio::time::Duration::from_millis(
                                200 * (attempt as u64 + 1),
                            ))
                            .await;
                        }
                    }
                }
            }

            info!(provider = %provider_name, "provider exhausted, trying next provider");
        }

        Err(last_err.unwrap_or_else(|| ProviderError::Unavailable("all providers failed".to_string())))
    }
}
