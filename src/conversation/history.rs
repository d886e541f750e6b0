use super::turn::{ConversationTurn, Speaker};

/// Ordered, append-only log of turns for one session
///
/// Nothing enforces user/bot alternation; `push_exchange` is how the
/// controller keeps it.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Append a user utterance followed by the bot reply
    pub fn push_exchange(&mut self, utterance: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(ConversationTurn::user(utterance));
        self.turns.push(ConversationTurn::bot(reply));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Rendered turns in emission order
    pub fn lines(&self) -> Vec<String> {
        self.turns.iter().map(ConversationTurn::render).collect()
    }

    /// The whole history as one newline-separated block
    pub fn transcript(&self) -> String {
        self.lines().join("\n")
    }

    pub fn last_bot_reply(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.speaker == Speaker::Bot)
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
