//! Speech-to-text with whisper.cpp

use crate::audio::{AudioClip, CAPTURE_SAMPLE_RATE};
use crate::{Result, TalkbackError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Configuration for the Whisper speech-to-text engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Path to the ggml model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,

    /// Translate to English instead of transcribing
    pub translate: bool,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.en.bin"),
            language: Some("en".to_string()),
            n_threads: 4,
            translate: false,
        }
    }
}

impl WhisperConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// Converts a captured clip into text
pub trait Transcriber {
    fn transcribe(&mut self, clip: &AudioClip) -> Result<String>;
}

/// Whisper context loaded once from a ggml file
pub struct WhisperTranscriber {
    config: WhisperConfig,
    context: WhisperContext,
}

impl WhisperTranscriber {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_path.exists() {
            return Err(TalkbackError::ModelLoad(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| TalkbackError::ModelLoad("Invalid model path".to_string()))?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| {
                TalkbackError::ModelLoad(format!("Failed to load Whisper model: {:?}", e))
            })?;

        info!("Whisper model loaded successfully");

        Ok(Self { config, context })
    }

    fn run(&self, samples: &[f32]) -> Result<String> {
        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(self.config.translate);
        params.set_print_timestamps(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);

        if let Some(ref lang) = self.config.language {
            params.set_language(Some(lang));
        }

        let mut state = self.context.create_state().map_err(|e| {
            TalkbackError::Recognition(format!("Failed to create state: {:?}", e))
        })?;

        state
            .full(params, samples)
            .map_err(|e| TalkbackError::Recognition(format!("Transcription failed: {:?}", e)))?;

        let num_segments = state
            .full_n_segments()
            .map_err(|e| TalkbackError::Recognition(format!("Failed to get segments: {:?}", e)))?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                TalkbackError::Recognition(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        Ok(text.trim().to_string())
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&mut self, clip: &AudioClip) -> Result<String> {
        if clip.is_empty() {
            return Err(TalkbackError::Recognition("Empty audio clip".to_string()));
        }

        if clip.sample_rate != CAPTURE_SAMPLE_RATE {
            return Err(TalkbackError::Recognition(format!(
                "Expected {} Hz audio, got {} Hz",
                CAPTURE_SAMPLE_RATE, clip.sample_rate
            )));
        }

        debug!(
            "Transcribing {} samples ({:.2}s)",
            clip.samples.len(),
            clip.duration_seconds()
        );

        let text = self.run(&clip.samples)?;
        if text.is_empty() {
            return Err(TalkbackError::Recognition(
                "Could not understand audio".to_string(),
            ));
        }

        debug!("Transcription result: '{}'", text);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_config_default() {
        let config = WhisperConfig::default();
        assert_eq!(config.model_path, PathBuf::from("models/ggml-base.en.bin"));
        assert_eq!(config.language.as_deref(), Some("en"));
        assert!(!config.translate);
    }

    #[test]
    fn test_missing_model_is_load_error() {
        let config = WhisperConfig::default().with_model_path("/nonexistent/ggml.bin");
        assert!(matches!(
            WhisperTranscriber::new(config),
            Err(TalkbackError::ModelLoad(_))
        ));
    }

    #[test]
    #[ignore = "requires models/ggml-base.en.bin"]
    fn test_silence_is_not_text() {
        let mut transcriber = WhisperTranscriber::new(WhisperConfig::default()).unwrap();
        let empty = AudioClip::new(Vec::new(), CAPTURE_SAMPLE_RATE);
        assert!(matches!(
            transcriber.transcribe(&empty),
            Err(TalkbackError::Recognition(_))
        ));
    }
}
