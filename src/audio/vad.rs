use crate::{Result, TalkbackError};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Voice Activity Detection using Silero VAD
pub struct VoiceActivityDetector {
    detector: VadDetector,
    sample_rate: u32,
    threshold: f32,
}

impl VoiceActivityDetector {
    /// Create a new VAD instance
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the audio (8000 or 16000)
    /// * `threshold` - Probability threshold for speech detection (0.0-1.0)
    pub fn new(sample_rate: u32, threshold: f32) -> Result<Self> {
        if ![8000, 16000].contains(&sample_rate) {
            return Err(TalkbackError::Config(format!(
                "Invalid sample rate: {}. Must be 8000 or 16000",
                sample_rate
            )));
        }

        let detector = VadDetector::builder()
            .sample_rate(sample_rate as i32)
            .chunk_size(chunk_size_for(sample_rate))
            .build()
            .map_err(|e| TalkbackError::AudioProcessing(format!("Failed to create VAD: {:?}", e)))?;

        info!(
            "Initialized VAD with sample rate: {}, threshold: {}",
            sample_rate, threshold
        );

        Ok(Self {
            detector,
            sample_rate,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Detect if the audio chunk contains speech
    pub fn is_speech(&mut self, audio: &[f32]) -> bool {
        self.probability(audio) >= self.threshold
    }

    /// Speech probability for the audio chunk (0.0-1.0)
    pub fn probability(&mut self, audio: &[f32]) -> f32 {
        self.detector.predict(audio.iter().copied())
    }

    /// Reset the VAD session state between captures
    pub fn reset(&mut self) {
        self.detector.reset();
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Samples per chunk the detector expects (32ms)
    pub fn chunk_size(&self) -> usize {
        chunk_size_for(self.sample_rate)
    }
}

fn chunk_size_for(sample_rate: u32) -> usize {
    match sample_rate {
        8000 => 256,
        _ => 512,
    }
}
