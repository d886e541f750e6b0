//! One request/response cycle at a time
//!
//! `start` walks `Idle → Capturing → Transcribing → Generating →
//! Responding → Idle`; text input skips the first two steps. Every failure
//! is turned into a notice here and leaves the history untouched. `speak_last`
//! is a separate action that only reads the last reply.

use crate::audio::SpeechCapture;
use crate::conversation::{build_prompt, ConversationHistory, PromptWindow};
use crate::llm::Responder;
use crate::session::events::{
    Capabilities, CycleOutcome, CycleResult, Notice, SessionEvent, SessionState, TurnInput,
};
use crate::speech::{Narrator, Transcriber};
use crate::{Result, TalkbackError};
use crossbeam_channel::Sender;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SessionController {
    capture: Option<Box<dyn SpeechCapture>>,
    transcriber: Option<Box<dyn Transcriber>>,
    responder: Option<Box<dyn Responder>>,
    narrator: Option<Box<dyn Narrator>>,
    history: ConversationHistory,
    window: PromptWindow,
    capture_timeout: Duration,
    state: SessionState,
    last_response: Option<String>,
    events: Option<Sender<SessionEvent>>,
}

impl SessionController {
    /// A controller with no collaborators; add them with the `with_*` methods
    pub fn new(window: PromptWindow, capture_timeout: Duration) -> Self {
        Self {
            capture: None,
            transcriber: None,
            responder: None,
            narrator: None,
            history: ConversationHistory::new(),
            window,
            capture_timeout,
            state: SessionState::Idle,
            last_response: None,
            events: None,
        }
    }

    pub fn with_capture(mut self, capture: Box<dyn SpeechCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_responder(mut self, responder: Box<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_narrator(mut self, narrator: Box<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Report state changes, notices and results on `events`
    pub fn with_events(mut self, events: Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Reply of the most recent cycle, if it produced one
    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            microphone: self.capture.is_some() && self.transcriber.is_some(),
            responder: self.responder.is_some(),
            narrator: self.narrator.is_some(),
        }
    }

    /// Run one full cycle for `input`
    pub fn start(&mut self, input: TurnInput) -> CycleOutcome {
        let id = Uuid::new_v4();
        let started = Instant::now();
        info!("Cycle {} started ({})", id, input.method());

        self.last_response = None;
        let result = self.run_cycle(input);
        self.set_state(SessionState::Idle);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!("Cycle {} finished in {}ms", id, elapsed_ms);

        CycleOutcome {
            id,
            result,
            elapsed_ms,
        }
    }

    /// Speak the reply of the most recent cycle
    pub fn speak_last(&mut self) -> Result<()> {
        let Some(reply) = self.last_response.clone() else {
            self.notify(Notice::warning("There is no response to speak yet."));
            return Err(TalkbackError::NoResponse);
        };

        let result = match self.narrator.as_mut() {
            Some(narrator) => narrator.speak(&reply).map_err(|e| match e {
                TalkbackError::Playback(_) => e,
                other => TalkbackError::Playback(other.to_string()),
            }),
            None => Err(TalkbackError::Playback(
                "Speech output is not available".into(),
            )),
        };

        if let Err(ref e) = result {
            warn!("Playback failed: {}", e);
            self.notify(Notice::error(format!("Error speaking response: {}", e)));
        }

        result
    }

    fn run_cycle(&mut self, input: TurnInput) -> CycleResult {
        let (utterance, recognition_error) = match input {
            TurnInput::Text(text) => (text, None),
            TurnInput::Microphone => match self.listen() {
                Ok(text) => {
                    self.notify(Notice::success(format!("Recognized Text: {}", text)));
                    (text, None)
                }
                Err(e) => {
                    warn!("Recognition failed: {}", e);
                    self.notify(Notice::error(format!("Error recognizing speech: {}", e)));
                    (String::new(), Some(e))
                }
            },
        };

        let utterance = utterance.trim();
        if utterance.is_empty() {
            self.notify(Notice::warning(
                "Please provide some input to generate a response.",
            ));
            return CycleResult::NoInput {
                error: recognition_error,
            };
        }

        self.set_state(SessionState::Generating);
        let prompt = build_prompt(self.history.turns(), utterance, &self.window);

        let reply = match self.responder.as_mut() {
            Some(responder) => responder.generate(&prompt),
            None => Err(TalkbackError::Generation(
                "Language model is not loaded".into(),
            )),
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                let e = match e {
                    TalkbackError::Generation(_) => e,
                    other => TalkbackError::Generation(other.to_string()),
                };
                warn!("Generation failed: {}", e);
                self.notify(Notice::error(format!("Error generating response: {}", e)));
                return CycleResult::GenerationFailed(e);
            }
        };

        self.set_state(SessionState::Responding);
        self.history.push_exchange(utterance, reply.as_str());
        self.last_response = Some(reply.clone());

        self.notify(Notice::success(format!("Generated Response: {}", reply)));
        self.emit(SessionEvent::Response(reply.clone()));
        self.emit(SessionEvent::HistoryUpdated(self.history.lines()));

        CycleResult::Replied {
            utterance: utterance.to_string(),
            reply,
        }
    }

    fn listen(&mut self) -> Result<String> {
        let (Some(capture), Some(transcriber)) = (self.capture.as_mut(), self.transcriber.as_mut())
        else {
            return Err(TalkbackError::Recognition(
                "Microphone input is not available".into(),
            ));
        };

        self.state = SessionState::Capturing;
        emit_to(&self.events, SessionEvent::StateChanged(SessionState::Capturing));
        emit_to(&self.events, SessionEvent::Notice(Notice::info("Listening...")));

        let clip = capture.capture(self.capture_timeout)?;

        self.state = SessionState::Transcribing;
        emit_to(&self.events, SessionEvent::StateChanged(SessionState::Transcribing));

        transcriber.transcribe(&clip)
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("Session state: {:?} -> {:?}", self.state, state);
            self.state = state;
            self.emit(SessionEvent::StateChanged(state));
        }
    }

    fn notify(&self, notice: Notice) {
        self.emit(SessionEvent::Notice(notice));
    }

    fn emit(&self, event: SessionEvent) {
        emit_to(&self.events, event);
    }
}

// Free function so it can be used while collaborators are mutably borrowed
fn emit_to(events: &Option<Sender<SessionEvent>>, event: SessionEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioClip, CAPTURE_SAMPLE_RATE};
    use crossbeam_channel::{unbounded, Receiver};

    struct EchoResponder;

    impl Responder for EchoResponder {
        fn generate(&mut self, prompt: &str) -> Result<String> {
            Ok(format!("echo {}", prompt.len()))
        }
    }

    struct SilentCapture;

    impl SpeechCapture for SilentCapture {
        fn capture(&mut self, timeout: Duration) -> Result<AudioClip> {
            Err(TalkbackError::CaptureTimeout(timeout.as_secs_f32()))
        }
    }

    struct FixedTranscriber(&'static str);

    impl Transcriber for FixedTranscriber {
        fn transcribe(&mut self, _clip: &AudioClip) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct ToneCapture;

    impl SpeechCapture for ToneCapture {
        fn capture(&mut self, _timeout: Duration) -> Result<AudioClip> {
            Ok(AudioClip::new(vec![0.1; 1600], CAPTURE_SAMPLE_RATE))
        }
    }

    fn controller() -> (SessionController, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded();
        let controller = SessionController::new(PromptWindow::default(), Duration::from_secs(5))
            .with_events(tx);
        (controller, rx)
    }

    fn states(rx: &Receiver<SessionEvent>) -> Vec<SessionState> {
        rx.try_iter()
            .filter_map(|e| match e {
                SessionEvent::StateChanged(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_text_cycle_states() {
        let (controller, rx) = controller();
        let mut controller = controller.with_responder(Box::new(EchoResponder));

        let outcome = controller.start(TurnInput::Text("Hi".into()));
        assert_eq!(outcome.reply(), Some("echo 2"));
        assert_eq!(
            states(&rx),
            vec![
                SessionState::Generating,
                SessionState::Responding,
                SessionState::Idle
            ]
        );
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn test_microphone_cycle_states() {
        let (controller, rx) = controller();
        let mut controller = controller
            .with_capture(Box::new(ToneCapture))
            .with_transcriber(Box::new(FixedTranscriber("hello there")))
            .with_responder(Box::new(EchoResponder));

        let outcome = controller.start(TurnInput::Microphone);
        assert!(matches!(outcome.result, CycleResult::Replied { .. }));
        assert_eq!(
            states(&rx),
            vec![
                SessionState::Capturing,
                SessionState::Transcribing,
                SessionState::Generating,
                SessionState::Responding,
                SessionState::Idle
            ]
        );
        assert_eq!(controller.history().lines()[0], "You: hello there");
    }

    #[test]
    fn test_capture_timeout_reports_both_notices() {
        let (controller, rx) = controller();
        let mut controller = controller
            .with_capture(Box::new(SilentCapture))
            .with_transcriber(Box::new(FixedTranscriber("unused")))
            .with_responder(Box::new(EchoResponder));

        let outcome = controller.start(TurnInput::Microphone);
        assert_eq!(
            outcome.result,
            CycleResult::NoInput {
                error: Some(TalkbackError::CaptureTimeout(5.0))
            }
        );

        let notices: Vec<Notice> = rx
            .try_iter()
            .filter_map(|e| match e {
                SessionEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect();
        let texts: Vec<&str> = notices.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Listening...",
                "Error recognizing speech: No speech detected before the 5.0s timeout",
                "Please provide some input to generate a response.",
            ]
        );
        assert!(controller.history().is_empty());
    }

    #[test]
    fn test_missing_microphone_is_recognition_error() {
        let (controller, _rx) = controller();
        let mut controller = controller.with_responder(Box::new(EchoResponder));

        let outcome = controller.start(TurnInput::Microphone);
        assert!(matches!(
            outcome.result,
            CycleResult::NoInput {
                error: Some(TalkbackError::Recognition(_))
            }
        ));
        assert!(!controller.capabilities().microphone);
    }

    #[test]
    fn test_whitespace_is_empty_input() {
        let (mut controller, _rx) = controller();
        let outcome = controller.start(TurnInput::Text("  \n ".into()));
        assert_eq!(outcome.result, CycleResult::NoInput { error: None });
    }

    #[test]
    fn test_utterance_is_trimmed() {
        let (controller, _rx) = controller();
        let mut controller = controller.with_responder(Box::new(EchoResponder));
        controller.start(TurnInput::Text("  Hello  ".into()));
        assert_eq!(controller.history().lines()[0], "You: Hello");
    }

    #[test]
    fn test_speak_without_narrator() {
        let (controller, rx) = controller();
        let mut controller = controller.with_responder(Box::new(EchoResponder));
        controller.start(TurnInput::Text("Hello".into()));
        rx.try_iter().count();

        let err = controller.speak_last().unwrap_err();
        assert!(matches!(err, TalkbackError::Playback(_)));
        assert!(rx.try_iter().any(|e| matches!(
            e,
            SessionEvent::Notice(ref n) if n.text.starts_with("Error speaking response: ")
        )));
        assert_eq!(controller.history().len(), 2);
    }
}
