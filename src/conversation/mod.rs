//! Conversation history and prompt assembly
//!
//! The history is an append-only log of `You:`/`Bot:` turns owned by the
//! session controller. Prompts are built from a bounded window of it.

pub mod history;
pub mod prompt;
pub mod turn;

pub use history::ConversationHistory;
pub use prompt::{build_prompt, estimate_tokens, PromptWindow};
pub use turn::{ConversationTurn, Speaker};
