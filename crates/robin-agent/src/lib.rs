//! Message routing for ROBIN.
//!
//! `Robin` decides how an inbound message is answered. The collaborators it
//! consults (classifier, context extractor, reply strategies, follow-up
//! decider) are traits; this crate also ships one concrete realization of
//! each, built on the text completion capability in `provider`/`ollama`.

pub mod classifier;
pub mod completion;
pub mod context;
pub mod failover;
pub mod follow_up;
pub mod history;
pub mod ollama;
pub mod prompt;
pub mod provider;
pub mod robin;
pub mod strategy;

pub use classifier::{KeywordClassifier, NeedClassifier};
pub use completion::CompletionClient;
pub use context::{ContextExtractor, HistoryContextExtractor};
pub use follow_up::{FollowUpDecider, RuleFollowUpDecider};
pub use history::ConversationHistory;
pub use robin::{ReplyStrategies, Robin};
pub use strategy::{CompletionReplier, ContextualReplier, DirectResponder, InvestigationReplier};
