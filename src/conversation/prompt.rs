use super::turn::ConversationTurn;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How much history goes into each prompt
///
/// Only the most recent turns are sent. Turns are dropped whole, oldest
/// first; the stored history is never touched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptWindow {
    /// Maximum number of history turns included
    pub max_turns: usize,

    /// Estimated token budget for history plus the new utterance
    pub max_tokens: usize,
}

impl Default for PromptWindow {
    fn default() -> Self {
        Self {
            max_turns: 20,
            max_tokens: 1024,
        }
    }
}

impl PromptWindow {
    pub fn new(max_turns: usize, max_tokens: usize) -> Self {
        Self {
            max_turns,
            max_tokens,
        }
    }

    /// Turns that fit the window, in emission order
    pub fn select<'a>(&self, turns: &'a [ConversationTurn], utterance: &str) -> &'a [ConversationTurn] {
        let mut remaining = self.max_tokens.saturating_sub(estimate_tokens(utterance));
        let mut start = turns.len();

        for turn in turns.iter().rev().take(self.max_turns) {
            let cost = estimate_tokens(&turn.render());
            if cost > remaining {
                break;
            }
            remaining -= cost;
            start -= 1;
        }

        &turns[start..]
    }
}

/// History context followed by the new utterance
///
/// Rendered turns are joined with single spaces; the prompt always ends
/// with `utterance`.
pub fn build_prompt(turns: &[ConversationTurn], utterance: &str, window: &PromptWindow) -> String {
    let selected = window.select(turns, utterance);

    if selected.len() < turns.len() {
        debug!(
            "Prompt window kept {} of {} turns",
            selected.len(),
            turns.len()
        );
    }

    if selected.is_empty() {
        return utterance.to_string();
    }

    let context = selected
        .iter()
        .map(ConversationTurn::render)
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {}", context, utterance)
}

/// Rough token count: about four characters per token, never fewer than
/// the number of words, minimum one
pub fn estimate_tokens(text: &str) -> usize {
    let char_estimate = text.chars().count().div_ceil(4);
    let word_estimate = text.split_whitespace().count();
    char_estimate.max(word_estimate).max(1)
}
