use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use robin_core::{Role, SessionId, Turn};

/// In-memory conversation history, one bounded queue per session.
///
/// Sessions are sharded by `DashMap`, so concurrent conversations do not
/// contend on a single lock. Each session is capped at `max_turns`, but the
/// set of sessions only shrinks through `clear` or `prune_idle`; long-running
/// hosts should call `prune_idle` periodically.
pub struct ConversationHistory {
    sessions: DashMap<SessionId, VecDeque<Turn>>,
    max_turns: usize,
}

impl ConversationHistory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Append a turn, evicting the oldest once the session is full.
    pub fn record(&self, session: &SessionId, turn: Turn) {
        let mut turns = self.sessions.entry(session.clone()).or_default();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
        debug!(session = %session, turns = turns.len(), "recorded turn");
    }

    /// Up to `n` most recent turns, oldest first.
    pub fn recent(&self, session: &SessionId, n: usize) -> Vec<Turn> {
        self.recent_before(session, n, None)
    }

    /// Up to `n` most recent turns recorded strictly before `before`
    /// (all turns when `None`), oldest first.
    pub fn recent_before(
        &self,
        session: &SessionId,
        n: usize,
        before: Option<DateTime<Utc>>,
    ) -> Vec<Turn> {
        let Some(turns) = self.sessions.get(session) else {
            return Vec::new();
        };
        let earlier: Vec<&Turn> = turns.iter().filter(|t| is_before(t, before)).collect();
        let skip = earlier.len().saturating_sub(n);
        let tail: Vec<Turn> = earlier.into_iter().skip(skip).cloned().collect();
        tail
    }

    /// Most recent user turn recorded strictly before `before`.
    ///
    /// A message stamped at `before` may already have been recorded; the
    /// cutoff keeps it from resolving to itself without hiding earlier turns
    /// that happen to share its text.
    pub fn last_user_turn(
        &self,
        session: &SessionId,
        before: Option<DateTime<Utc>>,
    ) -> Option<Turn> {
        let turns = self.sessions.get(session)?;
        let found = turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User && is_before(t, before))
            .cloned();
        found
    }

    /// Drop sessions whose newest turn is older than `max_idle`. Returns the
    /// number of sessions removed.
    pub fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, turns| turns.back().is_some_and(|t| t.at >= cutoff));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed, "pruned idle sessions");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn len(&self, session: &SessionId) -> usize {
        self.sessions.get(session).map(|t| t.len()).unwrap_or(0)
    }

    pub fn clear(&self, session: &SessionId) {
        self.sessions.remove(session);
    }
}

fn is_before(turn: &Turn, before: Option<DateTime<Utc>>) -> bool {
    before.map_or(true, |cutoff| turn.at < cutoff)
}
