use async_trait::async_trait;

use robin_core::config::FollowUpConfig;
use robin_core::{Message, Reply, Result};

/// Decides whether a follow-up question is attached to a reply.
///
/// Must be idempotent: feeding its own output back in adds nothing.
#[async_trait]
pub trait FollowUpDecider: Send + Sync {
    async fn maybe_add_follow_up(&self, reply: Reply, message: &Message) -> Result<Reply>;
}

const CLOSING_REMARKS: &[&str] = &[
    "thanks",
    "thank you",
    "thx",
    "bye",
    "goodbye",
    "see you",
    "that's all",
    "never mind",
];

/// Appends a fixed question unless the reply already asks one or the user
/// is wrapping up.
pub struct RuleFollowUpDecider {
    enabled: bool,
    question: String,
}

impl RuleFollowUpDecider {
    pub fn new(config: &FollowUpConfig) -> Self {
        Self {
            enabled: config.enabled,
            question: config.question.clone(),
        }
    }

    fn wants_follow_up(&self, reply: &Reply, message: &Message) -> bool {
        if !self.enabled || self.question.trim().is_empty() || reply.has_follow_up() {
            return false;
        }
        if reply.text.trim_end().ends_with('?') {
            return false;
        }
        !is_closing_remark(&message.text)
    }
}

fn is_closing_remark(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    let lowered = lowered.trim_end_matches(['.', '!', ' ']);
    CLOSING_REMARKS
        .iter()
        .any(|r| lowered == *r || lowered.starts_with(&format!("{r} ")) || lowered.starts_with(&format!("{r},")))
}

#[async_trait]
impl FollowUpDecider for RuleFollowUpDecider {
    async fn maybe_add_follow_up(&self, reply: Reply, message: &Message) -> Result<Reply> {
        if self.wants_follow_up(&reply, message) {
            Ok(reply.with_follow_up(self.question.clone()))
        } else {
            Ok(reply)
        }
    }
}
