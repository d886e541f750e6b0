pub mod buffer;
#[cfg(feature = "audio-io")]
pub mod capture;
#[cfg(feature = "audio-io")]
pub mod output;
pub mod preprocessor;
pub mod resampler;
pub mod segmenter;
pub mod vad;
pub mod wav;

pub use buffer::AudioRingBuffer;
#[cfg(feature = "audio-io")]
pub use capture::Microphone;
#[cfg(feature = "audio-io")]
pub use output::AudioOutput;
pub use resampler::AudioResampler;
pub use segmenter::{CaptureConfig, SegmenterStatus, UtteranceSegmenter};
pub use vad::VoiceActivityDetector;
pub use wav::{read_wav, write_wav};

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sample rate of every captured clip (what Whisper expects)
pub const CAPTURE_SAMPLE_RATE: u32 = 16000;

/// A captured mono clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Load a WAV file as a 16kHz mono clip
    pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (samples, sample_rate, channels) = read_wav(path)?;
        let samples = preprocessor::prepare_clip(&samples, sample_rate, channels)?;
        Ok(Self::new(samples, CAPTURE_SAMPLE_RATE))
    }

    /// Write the clip as a 16-bit mono WAV file
    pub fn save_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_wav(path, &self.samples, self.sample_rate, 1)
    }
}

/// Source of spoken utterances
///
/// Blocks until one utterance has been captured or `timeout` elapses
/// without speech onset.
pub trait SpeechCapture {
    fn capture(&mut self, timeout: Duration) -> Result<AudioClip>;
}
