use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use robin_core::{Context, Message, Result, RobinError};

use crate::history::ConversationHistory;

/// Builds a `Context` for a message classified as automated.
///
/// May perform I/O (a lookup, a remote call); any timeout policy belongs to
/// the implementation and must surface as `ExtractionFailed`.
#[async_trait]
pub trait ContextExtractor: Send + Sync {
    async fn extract_context(&self, message: &Message) -> Result<Context>;
}

/// Extracts context from the session's recorded conversation history.
pub struct HistoryContextExtractor {
    history: Arc<ConversationHistory>,
    context_turns: usize,
}

impl HistoryContextExtractor {
    pub fn new(history: Arc<ConversationHistory>, context_turns: usize) -> Self {
        Self {
            history,
            context_turns,
        }
    }
}

#[async_trait]
impl ContextExtractor for HistoryContextExtractor {
    async fn extract_context(&self, message: &Message) -> Result<Context> {
        let session = message.session.as_ref().ok_or_else(|| {
            RobinError::ExtractionFailed("message carries no session to look up".into())
        })?;

        // turns stamped at or after the message are the message itself (or later)
        let prior = self
            .history
            .last_user_turn(session, message.timestamp)
            .ok_or_else(|| {
                RobinError::ExtractionFailed(format!("no earlier turn recorded for session {session}"))
            })?;

        let history = self
            .history
            .recent_before(session, self.context_turns, message.timestamp);
        let entities = extract_entities(&[message.text.as_str(), prior.text.as_str()]);

        debug!(
            session = %session,
            history = history.len(),
            entities = entities.len(),
            "extracted context"
        );

        Ok(Context {
            prior_turn: Some(prior.text),
            entities,
            history,
        })
    }
}

/// Quoted phrases and capitalised words that don't start a sentence,
/// deduplicated in first-seen order.
pub fn extract_entities(texts: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |candidate: &str| {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !out.iter().any(|e| e == candidate) {
            out.push(candidate.to_string());
        }
    };

    for text in texts {
        for (i, quoted) in text.split('"').enumerate() {
            // odd segments sit between a pair of quotes
            if i % 2 == 1 {
                push(quoted);
            }
        }

        let mut sentence_start = true;
        for token in text.split_whitespace() {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            let capitalised = word.chars().next().is_some_and(|c| c.is_uppercase());
            let pronoun_i = word == "I" || word.starts_with("I'");
            if capitalised && !sentence_start && !pronoun_i {
                push(word);
            }
            sentence_start = token.ends_with(['.', '!', '?']);
        }
    }

    out
}
