//! Session state
//!
//! Append-only conversation history with cumulative token statistics.
//! A session is created empty at process start, mutated only by the
//! cooperative task that owns the current stream or command, and
//! destroyed at process exit.

use crate::types::{ConversationTurn, Role, SessionId, TokenStatistics};

/// Ordered conversation history plus token totals.
///
/// The session exclusively owns its turns; `history()` returns a snapshot
/// copy so caller mutations never reach internal state.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    history: Vec<ConversationTurn>,
    stats: TokenStatistics,
}

impl Session {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            history: Vec::new(),
            stats: TokenStatistics::default(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Append a turn. If the turn carries usage, fold it into the totals.
    pub fn add_turn(&mut self, turn: ConversationTurn) {
        if let Some(usage) = &turn.usage {
            self.stats.accumulate(usage);
        }
        self.history.push(turn);
    }

    /// Snapshot copy of the ordered history.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.history.clone()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Cumulative token statistics across all appended turns.
    pub fn stats(&self) -> TokenStatistics {
        self.stats
    }

    /// Reset history and statistics.
    pub fn clear(&mut self) {
        self.history.clear();
        self.stats = TokenStatistics::default();
    }

    /// Content of the most recent assistant turn, if any.
    pub fn last_assistant_response(&self) -> Option<String> {
        self.history
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.clone())
    }

    /// Replace the entire history with a single system turn holding the
    /// summary. Statistics are untouched so accumulated totals survive
    /// summarization.
    pub fn replace_with_summary(&mut self, summary: impl Into<String>) {
        self.history.clear();
        self.history.push(ConversationTurn::system(summary));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;

    #[test]
    fn test_add_turn_preserves_order() {
        let mut session = Session::new();
        for i in 0..10 {
            session.add_turn(ConversationTurn::user(format!("message {i}")));
        }

        let history = session.history();
        assert_eq!(history.len(), 10);
        for (i, turn) in history.iter().enumerate() {
            assert_eq!(turn.content, format!("message {i}"));
        }
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::user("original"));

        let mut snapshot = session.history();
        snapshot[0].content = "mutated".to_string();
        snapshot.push(ConversationTurn::user("extra"));

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].content, "original");
    }

    #[test]
    fn test_stats_equal_sum_of_usages() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::assistant("a").with_usage(TokenUsage::new(10, 3)));
        session.add_turn(ConversationTurn::user("no usage"));
        session.add_turn(ConversationTurn::assistant("b").with_usage(TokenUsage::new(7, 2)));

        let stats = session.stats();
        assert_eq!(stats.total_input_tokens, 17);
        assert_eq!(stats.total_output_tokens, 5);
    }

    #[test]
    fn test_clear_resets_history_and_stats() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::assistant("a").with_usage(TokenUsage::new(10, 3)));
        session.clear();

        assert!(session.is_empty());
        assert_eq!(session.stats(), TokenStatistics::default());
    }

    #[test]
    fn test_last_assistant_response() {
        let mut session = Session::new();
        assert_eq!(session.last_assistant_response(), None);

        session.add_turn(ConversationTurn::user("question"));
        session.add_turn(ConversationTurn::assistant("first"));
        session.add_turn(ConversationTurn::user("follow-up"));
        session.add_turn(ConversationTurn::assistant("second"));
        session.add_turn(ConversationTurn::user("latest"));

        assert_eq!(session.last_assistant_response(), Some("second".to_string()));
    }

    #[test]
    fn test_replace_with_summary_post_state() {
        let mut session = Session::new();
        session.add_turn(ConversationTurn::user("q"));
        session.add_turn(ConversationTurn::assistant("a").with_usage(TokenUsage::new(5, 5)));
        let stats_before = session.stats();

        session.replace_with_summary("the gist");

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::System);
        assert_eq!(history[0].content, "the gist");
        // Totals survive summarization.
        assert_eq!(session.stats(), stats_before);
    }
}
