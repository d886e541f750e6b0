//! Dedicated thread that owns the controller
//!
//! Models are loaded on the worker thread, then commands are processed one
//! at a time until `Shutdown` or until every command sender is gone.

use crate::config::AppConfig;
use crate::credentials::Credential;
use crate::llm::MistralResponder;
use crate::session::controller::SessionController;
use crate::session::events::{Notice, SessionCommand, SessionEvent};
use crate::speech::WhisperTranscriber;
use crate::{Result, TalkbackError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

#[cfg(feature = "audio-io")]
use crate::audio::Microphone;
#[cfg(feature = "audio-io")]
use crate::speech::SpeakerNarrator;

const FALLBACK_CAPTURE_TIMEOUT_SECS: u64 = 5;

/// UI side of the worker
pub struct SessionHandle {
    command_tx: Sender<SessionCommand>,
    event_rx: Receiver<SessionEvent>,
    join: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|e| TalkbackError::Channel(format!("Failed to send command: {}", e)))
    }

    /// Next pending event, if any
    ///
    /// Fails with `Channel` once the worker is gone and every event it sent
    /// has been received.
    pub fn try_recv_event(&self) -> Result<Option<SessionEvent>> {
        match self.event_rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TalkbackError::Channel(
                "Session worker stopped unexpectedly".into(),
            )),
        }
    }

    /// Ask the worker to stop and wait for it
    ///
    /// Blocks until the command in flight, if any, has finished.
    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("Session worker panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // Detach instead of joining so closing the window never waits on a model
        let _ = self.command_tx.send(SessionCommand::Shutdown);
    }
}

pub struct SessionWorker;

impl SessionWorker {
    /// Load every configured component and start serving commands
    pub fn spawn(config: AppConfig, credential: Option<Credential>) -> Result<SessionHandle> {
        Self::spawn_with(move |events| build_controller(&config, credential.as_ref(), events))
    }

    /// Start a worker around whatever controller `build` returns
    ///
    /// `build` runs on the worker thread, so collaborators never cross
    /// threads.
    pub fn spawn_with<F>(build: F) -> Result<SessionHandle>
    where
        F: FnOnce(Sender<SessionEvent>) -> SessionController + Send + 'static,
    {
        let (command_tx, command_rx) = bounded(16);
        let (event_tx, event_rx) = unbounded();

        let join = thread::Builder::new()
            .name("talkback-session".into())
            .spawn(move || run(build, command_rx, event_tx))?;

        Ok(SessionHandle {
            command_tx,
            event_rx,
            join: Some(join),
        })
    }
}

fn run<F>(build: F, command_rx: Receiver<SessionCommand>, event_tx: Sender<SessionEvent>)
where
    F: FnOnce(Sender<SessionEvent>) -> SessionController,
{
    info!("Session worker starting");

    let mut controller = build(event_tx.clone());
    let _ = event_tx.send(SessionEvent::Ready(controller.capabilities()));

    info!("Session worker ready: {:?}", controller.capabilities());

    for command in command_rx.iter() {
        match command {
            SessionCommand::Start(input) => {
                let outcome = controller.start(input);
                let _ = event_tx.send(SessionEvent::CycleFinished(outcome));
            }
            SessionCommand::Speak => {
                let error = controller.speak_last().err();
                let _ = event_tx.send(SessionEvent::SpeakFinished(error));
            }
            SessionCommand::Shutdown => {
                info!("Session worker shutdown requested");
                break;
            }
        }
    }

    let _ = event_tx.send(SessionEvent::Shutdown);
    info!("Session worker stopped");
}

/// Load the collaborators `config` enables
///
/// A component that fails to load is left out and reported with a
/// persistent notice; the gated language model is not attempted at all
/// without a credential.
pub fn build_controller(
    config: &AppConfig,
    credential: Option<&Credential>,
    events: Sender<SessionEvent>,
) -> SessionController {
    let report = |prefix: &str, e: &TalkbackError| {
        warn!("{}: {}", prefix, e);
        let _ = events.send(SessionEvent::Notice(
            Notice::error(format!("{}: {}", prefix, e)).persistent(),
        ));
    };

    // Microphone::new rejects the same settings, so the fallback is never used
    // for real capture
    let capture_timeout = config
        .capture
        .timeout()
        .unwrap_or(Duration::from_secs(FALLBACK_CAPTURE_TIMEOUT_SECS));

    let mut controller =
        SessionController::new(config.prompt.clone(), capture_timeout).with_events(events.clone());

    if credential.is_none() {
        let _ = events.send(SessionEvent::Notice(Notice::credential_missing(
            &config.credential_env,
        )));
    }

    if config.enable_audio_input {
        #[cfg(feature = "audio-io")]
        {
            match Microphone::new(config.capture.clone()) {
                Ok(microphone) => controller = controller.with_capture(Box::new(microphone)),
                Err(e) => report("Microphone unavailable", &e),
            }
        }
        #[cfg(not(feature = "audio-io"))]
        {
            report(
                "Microphone unavailable",
                &TalkbackError::AudioDevice("built without audio support".into()),
            );
        }

        match WhisperTranscriber::new(config.stt.clone()) {
            Ok(transcriber) => controller = controller.with_transcriber(Box::new(transcriber)),
            Err(e) => report("Speech recognition unavailable", &e),
        }
    }

    if credential.is_none() && config.llm.requires_credential {
        warn!("Not loading gated model {} without a token", config.llm.model_id);
    } else {
        match MistralResponder::load(config.llm.clone(), credential) {
            Ok(responder) => controller = controller.with_responder(Box::new(responder)),
            Err(e) => report("Language model unavailable", &e),
        }
    }

    if config.enable_audio_output {
        #[cfg(feature = "audio-io")]
        {
            match SpeakerNarrator::new(config.tts.clone()) {
                Ok(narrator) => controller = controller.with_narrator(Box::new(narrator)),
                Err(e) => report("Speech output unavailable", &e),
            }
        }
        #[cfg(not(feature = "audio-io"))]
        {
            report(
                "Speech output unavailable",
                &TalkbackError::AudioDevice("built without audio support".into()),
            );
        }
    }

    controller
}
