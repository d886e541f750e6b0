//! Application state management
//!
//! `UiState` mirrors what the session worker reports and queues the
//! commands produced by user actions. It never talks to the worker itself,
//! so it can be driven directly in tests.

use crate::session::{
    Capabilities, InputMethod, Notice, SessionCommand, SessionEvent, SessionState, TurnInput,
};
use crate::TalkbackError;

#[derive(Debug, Default)]
pub struct UiState {
    /// Selected input method
    pub input_method: InputMethod,
    /// Text typed for the Text Input method
    pub input_text: String,
    /// Set once the worker has finished loading models
    pub ready: bool,
    /// The worker is gone; nothing more can run this session
    pub disconnected: bool,
    /// Which components loaded
    pub capabilities: Capabilities,
    /// A command is in flight; Start and Speak are disabled
    pub busy: bool,
    /// Playback in progress
    pub speaking: bool,
    /// Current controller state
    pub session_state: SessionState,
    /// Status lines for the current cycle, plus persistent ones
    pub notices: Vec<Notice>,
    /// Reply of the current cycle
    pub response: Option<String>,
    /// Rendered conversation history
    pub history: Vec<String>,
    /// Duration of the last finished cycle
    pub last_cycle_ms: Option<u64>,
    pending: Vec<SessionCommand>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_start(&self) -> bool {
        self.ready && !self.busy
    }

    pub fn can_speak(&self) -> bool {
        self.ready && !self.busy && self.response.is_some()
    }

    /// Queue a start action for the selected input method
    pub fn request_start(&mut self) {
        if !self.can_start() {
            return;
        }

        let input = match self.input_method {
            InputMethod::Microphone => TurnInput::Microphone,
            InputMethod::TextInput => TurnInput::Text(self.input_text.clone()),
        };

        self.notices.retain(|n| n.persistent);
        self.response = None;
        self.busy = true;
        self.pending.push(SessionCommand::Start(input));
    }

    /// Queue playback of the current response
    pub fn request_speak(&mut self) {
        if !self.can_speak() {
            return;
        }
        self.notices.retain(|n| n.persistent);
        self.busy = true;
        self.speaking = true;
        self.pending.push(SessionCommand::Speak);
    }

    /// Commands queued since the last call
    pub fn take_commands(&mut self) -> Vec<SessionCommand> {
        std::mem::take(&mut self.pending)
    }

    /// A command could not be delivered
    pub fn command_failed(&mut self, error: &TalkbackError) {
        self.busy = false;
        self.speaking = false;
        self.notices.push(error_notice(error));
    }

    /// The worker stopped without sending `Shutdown`
    ///
    /// Reported once; later calls are ignored.
    pub fn session_lost(&mut self, error: &TalkbackError) {
        if self.disconnected {
            return;
        }
        self.disconnected = true;
        self.ready = false;
        self.busy = false;
        self.speaking = false;
        self.notices.push(error_notice(error));
    }

    pub fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Ready(capabilities) => {
                self.ready = true;
                self.capabilities = capabilities;
            }
            SessionEvent::StateChanged(state) => self.session_state = state,
            SessionEvent::Notice(notice) => self.notices.push(notice),
            SessionEvent::Response(reply) => self.response = Some(reply),
            SessionEvent::HistoryUpdated(lines) => self.history = lines,
            SessionEvent::CycleFinished(outcome) => {
                self.busy = false;
                self.last_cycle_ms = Some(outcome.elapsed_ms);
            }
            SessionEvent::SpeakFinished(_) => {
                self.busy = false;
                self.speaking = false;
            }
            SessionEvent::Shutdown => {
                self.disconnected = true;
                self.ready = false;
                self.busy = false;
                self.speaking = false;
            }
        }
    }

    /// History as shown on screen, one turn per line
    pub fn history_text(&self) -> String {
        self.history.join("\n")
    }
}

// Errors that outlive the current cycle stay on screen
fn error_notice(error: &TalkbackError) -> Notice {
    let notice = Notice::error(error.user_message());
    if error.is_recoverable() {
        notice
    } else {
        notice.persistent()
    }
}
