//! Messages exchanged between the UI and the session worker

use crate::TalkbackError;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How the user supplies the next utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMethod {
    #[default]
    Microphone,
    TextInput,
}

impl InputMethod {
    pub const ALL: [InputMethod; 2] = [InputMethod::Microphone, InputMethod::TextInput];

    pub fn label(&self) -> &'static str {
        match self {
            InputMethod::Microphone => "Microphone",
            InputMethod::TextInput => "Text Input",
        }
    }
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InputMethod {
    type Err = TalkbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.label() == s)
            .ok_or_else(|| TalkbackError::Config(format!("Unknown input method: {}", s)))
    }
}

/// Payload of a start action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnInput {
    Microphone,
    Text(String),
}

impl TurnInput {
    pub fn method(&self) -> InputMethod {
        match self {
            TurnInput::Microphone => InputMethod::Microphone,
            TurnInput::Text(_) => InputMethod::TextInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// User-visible status line
///
/// Persistent notices survive the start of the next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub persistent: bool,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            persistent: false,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Shown for the whole session when the access token is absent
    pub fn credential_missing(var: &str) -> Self {
        Self::error(format!(
            "Hugging Face token is not set. Please set {} in the environment.",
            var
        ))
        .persistent()
    }
}

/// Where the controller is within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Capturing,
    Transcribing,
    Generating,
    Responding,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Capturing => "Listening",
            SessionState::Transcribing => "Transcribing",
            SessionState::Generating => "Generating",
            SessionState::Responding => "Responding",
        }
    }

    pub fn is_busy(&self) -> bool {
        !matches!(self, SessionState::Idle)
    }
}

/// Which collaborators loaded successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub microphone: bool,
    pub responder: bool,
    pub narrator: bool,
}

/// How a start action ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleResult {
    /// History gained the utterance and the reply
    Replied { utterance: String, reply: String },

    /// Nothing to send; carries the recognition failure when capture was used
    NoInput { error: Option<TalkbackError> },

    /// The responder failed or is unavailable
    GenerationFailed(TalkbackError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub id: Uuid,
    pub result: CycleResult,
    pub elapsed_ms: u64,
}

impl CycleOutcome {
    pub fn reply(&self) -> Option<&str> {
        match &self.result {
            CycleResult::Replied { reply, .. } => Some(reply),
            _ => None,
        }
    }
}

/// Requests sent to the worker, processed one at a time
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start(TurnInput),
    Speak,
    Shutdown,
}

/// Reports from the worker
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Models finished loading; commands are accepted from now on
    Ready(Capabilities),

    StateChanged(SessionState),

    Notice(Notice),

    /// Reply generated for the current cycle
    Response(String),

    /// Full rendered history after an exchange was appended
    HistoryUpdated(Vec<String>),

    CycleFinished(CycleOutcome),

    /// Playback ended; the error when it was rejected or failed
    SpeakFinished(Option<TalkbackError>),

    Shutdown,
}
