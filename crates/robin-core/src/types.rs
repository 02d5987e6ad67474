use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, RobinError};

/// Identifies the conversation a message belongs to (sender or session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        // UUIDv7 includes timestamp — sortable and traceable in logs
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One inbound conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session: None,
            timestamp: None,
        }
    }

    pub fn with_session(mut self, session: impl Into<SessionId>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Stamp the message with the current time.
    pub fn now(self) -> Self {
        self.with_timestamp(Utc::now())
    }
}

/// Structured information extracted from a message.
///
/// Opaque to the router; only reply strategies look inside.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Context {
    /// Most relevant earlier user turn, if any.
    pub prior_turn: Option<String>,
    /// Resolved entities, first-seen order, no duplicates.
    #[serde(default)]
    pub entities: Vec<String>,
    /// Recent turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl Context {
    pub fn with_prior_turn(text: impl Into<String>) -> Self {
        Self {
            prior_turn: Some(text.into()),
            ..Self::default()
        }
    }

    /// Render as a plain-text prompt section.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(prior) = &self.prior_turn {
            out.push_str(&format!("Previous request: {prior}\n"));
        }
        if !self.entities.is_empty() {
            out.push_str(&format!("Entities: {}\n", self.entities.join(", ")));
        }
        if !self.history.is_empty() {
            out.push_str("Recent conversation:\n");
            for turn in &self.history {
                out.push_str(&format!("- {}: {}\n", turn.role, turn.text));
            }
        }
        out
    }
}

/// Text to send back, plus the follow-up question once one has been attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            follow_up: None,
        }
    }

    /// Explicit deferral. Strategies use this instead of returning nothing.
    pub fn deferral(reason: impl AsRef<str>) -> Self {
        Self::new(format!(
            "I can't answer that right away ({}). I've noted it and will come back to you.",
            reason.as_ref()
        ))
    }

    pub fn has_follow_up(&self) -> bool {
        self.follow_up.is_some()
    }

    /// Attach a follow-up question. A reply that already has one is returned unchanged.
    pub fn with_follow_up(mut self, question: impl Into<String>) -> Self {
        if self.follow_up.is_none() {
            self.follow_up = Some(question.into());
        }
        self
    }

    /// Final text as shown to the user.
    pub fn render(&self) -> String {
        match &self.follow_up {
            Some(q) => format!("{}\n\n{}", self.text, q),
            None => self.text.clone(),
        }
    }
}

/// Routing outcome for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// No investigation needed.
    Direct,
    /// Investigation satisfiable from extracted context.
    Automated,
    /// Investigation without automatable context.
    Manual,
}

impl Decision {
    /// Combine the two classifier answers. `automatable` is only meaningful
    /// when investigation is needed; passing `Some` otherwise is rejected.
    pub fn from_flags(needs_investigation: bool, automatable: Option<bool>) -> Result<Self> {
        match (needs_investigation, automatable) {
            (false, None) => Ok(Decision::Direct),
            (true, Some(true)) => Ok(Decision::Automated),
            (true, Some(false)) => Ok(Decision::Manual),
            (true, None) => Err(RobinError::InvalidState(
                "context automation not assessed for a message needing investigation".into(),
            )),
            (false, Some(_)) => Err(RobinError::InvalidState(
                "context automation assessed for a message not needing investigation".into(),
            )),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Direct => write!(f, "direct"),
            Decision::Automated => write!(f, "automated"),
            Decision::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One recorded item of conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}
