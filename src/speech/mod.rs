//! Speech processing modules for STT and TTS
//!
//! This module provides:
//! - Speech-to-text (STT) using Whisper
//! - Text-to-speech (TTS) using VITS voices through sherpa-rs

pub mod stt;
pub mod tts;

pub use stt::{Transcriber, WhisperConfig, WhisperTranscriber};
#[cfg(feature = "audio-io")]
pub use tts::SpeakerNarrator;
pub use tts::{normalize_text_for_tts, Narrator, TTSConfig, TTSEngine, VITS_SAMPLE_RATE};
