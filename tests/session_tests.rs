//! End-to-end behavior of the session controller with scripted collaborators

use crossbeam_channel::{unbounded, Receiver};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use talkback::audio::{AudioClip, SpeechCapture, CAPTURE_SAMPLE_RATE};
use talkback::config::AppConfig;
use talkback::conversation::PromptWindow;
use talkback::llm::Responder;
use talkback::session::{
    build_controller, CycleResult, Notice, NoticeLevel, SessionController, SessionEvent,
    TurnInput,
};
use talkback::speech::{Narrator, Transcriber};
use talkback::{Result, TalkbackError};

struct ScriptedCapture(VecDeque<Result<AudioClip>>);

impl SpeechCapture for ScriptedCapture {
    fn capture(&mut self, timeout: Duration) -> Result<AudioClip> {
        self.0
            .pop_front()
            .unwrap_or(Err(TalkbackError::CaptureTimeout(timeout.as_secs_f32())))
    }
}

struct ScriptedTranscriber(VecDeque<Result<String>>);

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&mut self, _clip: &AudioClip) -> Result<String> {
        self.0
            .pop_front()
            .unwrap_or(Err(TalkbackError::Recognition("script exhausted".into())))
    }
}

/// Records every prompt and answers from a script
struct RecordingResponder {
    prompts: Arc<Mutex<Vec<String>>>,
    replies: VecDeque<Result<String>>,
}

impl Responder for RecordingResponder {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Ok(format!("reply {}", self.prompts.lock().len())))
    }
}

struct RecordingNarrator {
    spoken: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl Narrator for RecordingNarrator {
    fn speak(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(TalkbackError::Playback("device unplugged".into()));
        }
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

fn tone() -> AudioClip {
    AudioClip::new(vec![0.2; 8000], CAPTURE_SAMPLE_RATE)
}

struct Fixture {
    controller: SessionController,
    events: Receiver<SessionEvent>,
    prompts: Arc<Mutex<Vec<String>>>,
    spoken: Arc<Mutex<Vec<String>>>,
}

impl Fixture {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self::with_window(replies, PromptWindow::default())
    }

    fn with_window(replies: Vec<Result<String>>, window: PromptWindow) -> Self {
        let (tx, rx) = unbounded();
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let spoken = Arc::new(Mutex::new(Vec::new()));

        let controller = SessionController::new(window, Duration::from_secs(5))
            .with_events(tx)
            .with_responder(Box::new(RecordingResponder {
                prompts: Arc::clone(&prompts),
                replies: replies.into(),
            }))
            .with_narrator(Box::new(RecordingNarrator {
                spoken: Arc::clone(&spoken),
                fail: false,
            }));

        Self {
            controller,
            events: rx,
            prompts,
            spoken,
        }
    }

    fn with_microphone(
        mut self,
        clips: Vec<Result<AudioClip>>,
        texts: Vec<Result<String>>,
    ) -> Self {
        self.controller = self
            .controller
            .with_capture(Box::new(ScriptedCapture(clips.into())))
            .with_transcriber(Box::new(ScriptedTranscriber(texts.into())));
        self
    }

    fn notices(&self) -> Vec<Notice> {
        self.events
            .try_iter()
            .filter_map(|e| match e {
                SessionEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }
}

#[test]
fn n_exchanges_grow_history_by_two_n() {
    let mut f = Fixture::new(vec![Ok("one".into()), Ok("two".into()), Ok("three".into())]);

    for text in ["a", "b", "c"] {
        let outcome = f.controller.start(TurnInput::Text(text.into()));
        assert!(matches!(outcome.result, CycleResult::Replied { .. }));
    }

    assert_eq!(f.controller.history().len(), 6);
    assert_eq!(
        f.controller.history().lines(),
        vec!["You: a", "Bot: one", "You: b", "Bot: two", "You: c", "Bot: three"]
    );
}

#[test]
fn text_hello_appends_exactly_one_exchange() {
    let mut f = Fixture::new(vec![Ok("Hi there!".into())]);

    let outcome = f.controller.start(TurnInput::Text("Hello".into()));

    assert_eq!(outcome.reply(), Some("Hi there!"));
    assert!(f.prompts.lock()[0].ends_with("Hello"));
    assert_eq!(
        f.controller.history().lines(),
        vec!["You: Hello", "Bot: Hi there!"]
    );

    let notices = f.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].text, "Generated Response: Hi there!");
}

#[test]
fn prompt_carries_prior_history() {
    let mut f = Fixture::new(vec![Ok("Hi there!".into()), Ok("Fine.".into())]);

    f.controller.start(TurnInput::Text("Hello".into()));
    f.controller.start(TurnInput::Text("How are you?".into()));

    assert_eq!(f.prompts.lock()[0], "Hello");
    assert_eq!(f.prompts.lock()[1], "You: Hello Bot: Hi there! How are you?");
}

#[test]
fn prompt_window_drops_oldest_turns() {
    let mut f = Fixture::with_window(vec![], PromptWindow::new(2, 10_000));

    for text in ["first", "second", "third"] {
        f.controller.start(TurnInput::Text(text.into()));
    }

    let prompts = f.prompts.lock();
    assert_eq!(prompts[2], "You: second Bot: reply 2 third");
    assert_eq!(f.controller.history().len(), 6);
}

#[test]
fn capture_timeout_leaves_history_unchanged() {
    let mut f = Fixture::new(vec![Ok("ok".into())]).with_microphone(
        vec![Err(TalkbackError::CaptureTimeout(5.0))],
        vec![],
    );
    f.controller.start(TurnInput::Text("before".into()));
    let before = f.controller.history().lines();
    f.notices();

    let outcome = f.controller.start(TurnInput::Microphone);

    assert!(matches!(
        outcome.result,
        CycleResult::NoInput {
            error: Some(TalkbackError::CaptureTimeout(_))
        }
    ));
    assert_eq!(f.controller.history().lines(), before);
    assert_eq!(f.prompts.lock().len(), 1);

    let levels: Vec<NoticeLevel> = f.notices().iter().map(|n| n.level).collect();
    assert_eq!(
        levels,
        vec![NoticeLevel::Info, NoticeLevel::Error, NoticeLevel::Warning]
    );
}

#[test]
fn recognition_failure_leaves_history_unchanged() {
    let mut f = Fixture::new(vec![]).with_microphone(
        vec![Ok(tone())],
        vec![Err(TalkbackError::Recognition("Could not understand audio".into()))],
    );

    let outcome = f.controller.start(TurnInput::Microphone);

    assert!(matches!(outcome.result, CycleResult::NoInput { error: Some(_) }));
    assert!(f.controller.history().is_empty());
    assert!(f.prompts.lock().is_empty());

    let texts: Vec<String> = f.notices().into_iter().map(|n| n.text).collect();
    assert!(texts.contains(
        &"Error recognizing speech: Recognition error: Could not understand audio".to_string()
    ));
}

#[test]
fn microphone_cycle_reports_recognized_text() {
    let mut f = Fixture::new(vec![Ok("Hello to you".into())])
        .with_microphone(vec![Ok(tone())], vec![Ok("hello bot".into())]);

    f.controller.start(TurnInput::Microphone);

    let events: Vec<SessionEvent> = f.events.try_iter().collect();
    assert!(events.contains(&SessionEvent::Notice(Notice::info("Listening..."))));
    assert!(events.contains(&SessionEvent::Notice(Notice::success(
        "Recognized Text: hello bot"
    ))));
    assert!(events.contains(&SessionEvent::HistoryUpdated(vec![
        "You: hello bot".into(),
        "Bot: Hello to you".into()
    ])));
    assert_eq!(f.prompts.lock()[0], "hello bot");
}

#[test]
fn empty_input_skips_responder() {
    let mut f = Fixture::new(vec![]);

    for text in ["", "   "] {
        let outcome = f.controller.start(TurnInput::Text(text.into()));
        assert_eq!(outcome.result, CycleResult::NoInput { error: None });
    }

    assert!(f.prompts.lock().is_empty());
    assert!(f.controller.history().is_empty());

    let notices = f.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Warning
        && n.text == "Please provide some input to generate a response."));
}

#[test]
fn generation_failure_leaves_history_unchanged() {
    let mut f = Fixture::new(vec![
        Ok("fine".into()),
        Err(TalkbackError::Generation("model exploded".into())),
    ]);
    f.controller.start(TurnInput::Text("first".into()));
    f.notices();

    let outcome = f.controller.start(TurnInput::Text("second".into()));

    assert_eq!(
        outcome.result,
        CycleResult::GenerationFailed(TalkbackError::Generation("model exploded".into()))
    );
    assert_eq!(f.controller.history().len(), 2);
    assert_eq!(
        f.notices(),
        vec![Notice::error(
            "Error generating response: Generation error: model exploded"
        )]
    );
}

#[test]
fn speak_without_response_is_rejected() {
    let mut f = Fixture::new(vec![]);

    assert_eq!(f.controller.speak_last(), Err(TalkbackError::NoResponse));
    assert!(f.spoken.lock().is_empty());
    assert_eq!(
        f.notices(),
        vec![Notice::warning("There is no response to speak yet.")]
    );
}

#[test]
fn speak_after_failed_cycle_is_rejected() {
    let mut f = Fixture::new(vec![
        Ok("first reply".into()),
        Err(TalkbackError::Generation("boom".into())),
    ]);
    f.controller.start(TurnInput::Text("one".into()));
    f.controller.start(TurnInput::Text("two".into()));

    assert_eq!(f.controller.speak_last(), Err(TalkbackError::NoResponse));
    assert!(f.spoken.lock().is_empty());
}

#[test]
fn speak_plays_last_reply_without_touching_history() {
    let mut f = Fixture::new(vec![Ok("Nice to meet you.".into())]);
    f.controller.start(TurnInput::Text("Hi".into()));

    f.controller.speak_last().unwrap();
    f.controller.speak_last().unwrap();

    assert_eq!(
        *f.spoken.lock(),
        vec!["Nice to meet you.".to_string(), "Nice to meet you.".to_string()]
    );
    assert_eq!(f.controller.history().len(), 2);
}

#[test]
fn playback_failure_is_reported() {
    let (tx, rx) = unbounded();
    let mut controller = SessionController::new(PromptWindow::default(), Duration::from_secs(5))
        .with_events(tx)
        .with_responder(Box::new(RecordingResponder {
            prompts: Arc::new(Mutex::new(Vec::new())),
            replies: VecDeque::from([Ok("hello".to_string())]),
        }))
        .with_narrator(Box::new(RecordingNarrator {
            spoken: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }));
    controller.start(TurnInput::Text("Hi".into()));
    rx.try_iter().count();

    let err = controller.speak_last().unwrap_err();

    assert_eq!(err, TalkbackError::Playback("device unplugged".into()));
    assert_eq!(controller.history().len(), 2);
    let notices: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(
        notices,
        vec![SessionEvent::Notice(Notice::error(
            "Error speaking response: Playback error: device unplugged"
        ))]
    );
}

#[test]
fn missing_credential_does_not_load_gated_model() {
    let (tx, rx) = unbounded();
    let config = AppConfig::default()
        .without_audio_input()
        .without_audio_output();

    let mut controller = build_controller(&config, None, tx);

    assert!(!controller.capabilities().responder);
    let events: Vec<SessionEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![SessionEvent::Notice(Notice::credential_missing(
            "HUGGING_FACE_TOKEN"
        ))]
    );

    let outcome = controller.start(TurnInput::Text("Hello".into()));
    assert!(matches!(
        outcome.result,
        CycleResult::GenerationFailed(TalkbackError::Generation(_))
    ));
    assert!(controller.history().is_empty());
}

#[test]
fn infinite_capture_timeout_does_not_abort_startup() {
    let (tx, _rx) = unbounded();
    let mut config = AppConfig::default()
        .without_audio_input()
        .without_audio_output();
    config.capture.timeout_secs = f32::INFINITY;

    let mut controller = build_controller(&config, None, tx);

    assert!(!controller.capabilities().microphone);
    let outcome = controller.start(TurnInput::Microphone);
    assert!(matches!(
        outcome.result,
        CycleResult::NoInput {
            error: Some(TalkbackError::Recognition(_))
        }
    ));
}
