use std::sync::Arc;

use tracing::debug;

use robin_core::{Decision, Message, Reply, Result};

use crate::classifier::{self, NeedClassifier};
use crate::context::ContextExtractor;
use crate::follow_up::FollowUpDecider;
use crate::strategy::{ContextualReplier, DirectResponder, InvestigationReplier};

/// The three reply strategies, one per routing outcome.
#[derive(Clone)]
pub struct ReplyStrategies {
    pub contextual: Arc<dyn ContextualReplier>,
    pub investigation: Arc<dyn InvestigationReplier>,
    pub direct: Arc<dyn DirectResponder>,
}

/// Message router: picks exactly one reply strategy per message.
///
/// Holds no mutable state, so one instance can serve concurrent calls for
/// different messages. Collaborator errors are returned untouched; the router
/// never retries, logs, or falls back on their behalf.
#[derive(Clone)]
pub struct Robin {
    classifier: Arc<dyn NeedClassifier>,
    extractor: Arc<dyn ContextExtractor>,
    strategies: ReplyStrategies,
    follow_up: Arc<dyn FollowUpDecider>,
}

impl Robin {
    pub fn new(
        classifier: Arc<dyn NeedClassifier>,
        extractor: Arc<dyn ContextExtractor>,
        strategies: ReplyStrategies,
        follow_up: Arc<dyn FollowUpDecider>,
    ) -> Self {
        Self {
            classifier,
            extractor,
            strategies,
            follow_up,
        }
    }

    /// Classify a message without generating a reply.
    pub fn decide(&self, message: &Message) -> Result<Decision> {
        classifier::classify(&*self.classifier, message)
    }

    /// Produce the reply for one inbound message.
    ///
    /// - no investigation: direct response
    /// - investigation, automatable: extract context, then context-driven reply
    /// - investigation, not automatable: context-free investigation reply
    ///
    /// Every branch ends in the follow-up decider.
    pub async fn generate_reply(&self, message: &Message) -> Result<Reply> {
        let reply = if !self.classifier.needs_investigation(message) {
            debug!(decision = %Decision::Direct, "routing message");
            self.strategies.direct.generate_response(message).await?
        } else if self.classifier.can_automate_context(message)? {
            debug!(decision = %Decision::Automated, "routing message");
            let context = self.extractor.extract_context(message).await?;
            self.strategies
                .contextual
                .generate_with_context(message, &context)
                .await?
        } else {
            debug!(decision = %Decision::Manual, "routing message");
            self.strategies
                .investigation
                .generate_without_context(message)
                .await?
        };

        self.follow_up.maybe_add_follow_up(reply, message).await
    }
}
