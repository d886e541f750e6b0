//! Utterance segmentation for microphone capture
//!
//! Turns a stream of 16kHz chunks, each tagged by the VAD, into a single
//! utterance: calibrate against ambient noise, wait for speech onset (bounded
//! by the capture timeout), then record until a pause or the phrase limit.

use crate::audio::buffer::AudioRingBuffer;
use crate::audio::preprocessor::rms;
use crate::audio::CAPTURE_SAMPLE_RATE;
use crate::{Result, TalkbackError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Upper bound accepted for any capture duration (seconds)
pub const MAX_CAPTURE_SECS: f32 = 600.0;

/// Microphone capture parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// How long to wait for speech onset before giving up (seconds)
    pub timeout_secs: f32,

    /// Ambient noise measured before listening (seconds)
    pub ambient_duration_secs: f32,

    /// Speech must be this many times louder than the ambient level
    pub energy_ratio: f32,

    /// Lower bound for the energy floor
    pub min_energy: f32,

    /// Silero VAD probability threshold
    pub vad_threshold: f32,

    /// Trailing non-speech that ends the phrase (seconds)
    pub pause_duration_secs: f32,

    /// Longest phrase recorded (seconds)
    pub phrase_limit_secs: f32,

    /// Audio kept from just before onset (seconds)
    pub pre_roll_secs: f32,

    /// Write every captured clip here as WAV when set
    pub recordings_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5.0,
            ambient_duration_secs: 0.5,
            energy_ratio: 1.5,
            min_energy: 0.003,
            vad_threshold: 0.5,
            pause_duration_secs: 0.8,
            phrase_limit_secs: 30.0,
            pre_roll_secs: 0.3,
            recordings_dir: None,
        }
    }
}

impl CaptureConfig {
    /// Onset timeout as a `Duration`
    pub fn timeout(&self) -> Result<Duration> {
        seconds_to_duration("timeout_secs", self.timeout_secs)
    }

    /// Wall-clock budget for audio after the onset wait: calibration plus
    /// the longest phrase
    pub fn recording_budget(&self) -> Result<Duration> {
        Ok(seconds_to_duration("ambient_duration_secs", self.ambient_duration_secs)?
            + seconds_to_duration("phrase_limit_secs", self.phrase_limit_secs)?)
    }

    /// Every duration must be finite, non-negative and at most
    /// `MAX_CAPTURE_SECS`
    pub fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("timeout_secs", self.timeout_secs),
            ("ambient_duration_secs", self.ambient_duration_secs),
            ("pause_duration_secs", self.pause_duration_secs),
            ("phrase_limit_secs", self.phrase_limit_secs),
            ("pre_roll_secs", self.pre_roll_secs),
        ] {
            seconds_to_duration(name, secs)?;
        }

        if !(0.0..=1.0).contains(&self.vad_threshold) {
            return Err(TalkbackError::Config(format!(
                "vad_threshold must be between 0 and 1, got {}",
                self.vad_threshold
            )));
        }
        if !self.energy_ratio.is_finite() || !self.min_energy.is_finite() {
            return Err(TalkbackError::Config(
                "energy_ratio and min_energy must be finite".into(),
            ));
        }

        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f32();
        self
    }

    pub fn with_recordings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recordings_dir = Some(dir.into());
        self
    }
}

fn seconds_to_duration(name: &str, secs: f32) -> Result<Duration> {
    if !(0.0..=MAX_CAPTURE_SECS).contains(&secs) {
        return Err(TalkbackError::Config(format!(
            "{} must be between 0 and {}s, got {}",
            name, MAX_CAPTURE_SECS, secs
        )));
    }
    Duration::try_from_secs_f32(secs)
        .map_err(|e| TalkbackError::Config(format!("{} is not a valid duration: {}", name, e)))
}

fn seconds_to_samples(secs: f32) -> usize {
    (secs.max(0.0) * CAPTURE_SAMPLE_RATE as f32) as usize
}

/// Result of feeding one chunk to the segmenter
#[derive(Debug, Clone, PartialEq)]
pub enum SegmenterStatus {
    /// Still measuring ambient noise
    Calibrating,
    /// Calibrated, no speech yet
    Waiting,
    /// Speech in progress
    Recording,
    /// Utterance finished; pre-roll plus phrase audio
    Complete(Vec<f32>),
    /// No onset before the timeout
    TimedOut,
    /// A final status was already returned
    Closed,
}

enum Phase {
    Calibrating { sum_squares: f64, samples: usize },
    Waiting { waited: usize },
    Recording { recorded: Vec<f32>, trailing_silence: usize },
    Closed,
}

/// Speech onset/offset detector over 16kHz mono chunks
pub struct UtteranceSegmenter {
    phase: Phase,
    noise_floor: f32,
    energy_ratio: f32,
    ambient_samples: usize,
    timeout_samples: usize,
    pause_samples: usize,
    phrase_limit_samples: usize,
    pre_roll: AudioRingBuffer,
}

impl UtteranceSegmenter {
    /// Create a segmenter whose onset timeout overrides the configured one
    pub fn new(config: &CaptureConfig, timeout: Duration) -> Self {
        let ambient_samples = seconds_to_samples(config.ambient_duration_secs);
        let phase = if ambient_samples == 0 {
            Phase::Waiting { waited: 0 }
        } else {
            Phase::Calibrating {
                sum_squares: 0.0,
                samples: 0,
            }
        };

        Self {
            phase,
            noise_floor: config.min_energy,
            energy_ratio: config.energy_ratio,
            ambient_samples,
            timeout_samples: seconds_to_samples(timeout.as_secs_f32()),
            pause_samples: seconds_to_samples(config.pause_duration_secs).max(1),
            phrase_limit_samples: seconds_to_samples(config.phrase_limit_secs).max(1),
            pre_roll: AudioRingBuffer::new(seconds_to_samples(config.pre_roll_secs)),
        }
    }

    /// Energy a chunk needs to count as speech
    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Feed one chunk along with the VAD verdict for it
    pub fn push_chunk(&mut self, chunk: &[f32], vad_speech: bool) -> SegmenterStatus {
        let is_speech = vad_speech && rms(chunk) >= self.noise_floor;

        match &mut self.phase {
            Phase::Calibrating {
                sum_squares,
                samples,
            } => {
                *sum_squares += chunk.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>();
                *samples += chunk.len();

                if *samples >= self.ambient_samples {
                    let ambient_rms = (*sum_squares / *samples as f64).sqrt() as f32;
                    self.noise_floor = self.noise_floor.max(ambient_rms * self.energy_ratio);
                    debug!(
                        "Ambient rms {:.4}, noise floor set to {:.4}",
                        ambient_rms, self.noise_floor
                    );
                    self.phase = Phase::Waiting { waited: 0 };
                    return SegmenterStatus::Waiting;
                }
                SegmenterStatus::Calibrating
            }
            Phase::Waiting { waited } => {
                if is_speech {
                    debug!("Speech onset after {} samples", waited);
                    let mut recorded = self.pre_roll.drain_all();
                    recorded.extend_from_slice(chunk);
                    self.phase = Phase::Recording {
                        recorded,
                        trailing_silence: 0,
                    };
                    return self.check_phrase_limit();
                }

                *waited += chunk.len();
                self.pre_roll.write(chunk);

                if *waited >= self.timeout_samples {
                    debug!("No speech onset within {} samples", self.timeout_samples);
                    self.phase = Phase::Closed;
                    return SegmenterStatus::TimedOut;
                }
                SegmenterStatus::Waiting
            }
            Phase::Recording {
                recorded,
                trailing_silence,
            } => {
                recorded.extend_from_slice(chunk);

                if is_speech {
                    *trailing_silence = 0;
                } else {
                    *trailing_silence += chunk.len();
                    if *trailing_silence >= self.pause_samples {
                        debug!("Pause detected, phrase complete");
                        return self.close();
                    }
                }
                self.check_phrase_limit()
            }
            Phase::Closed => SegmenterStatus::Closed,
        }
    }

    /// End the capture early (e.g. the input stream stopped)
    ///
    /// Returns the partial phrase if speech had started.
    pub fn finish(&mut self) -> Option<Vec<f32>> {
        match std::mem::replace(&mut self.phase, Phase::Closed) {
            Phase::Recording { recorded, .. } => Some(recorded),
            _ => None,
        }
    }

    fn check_phrase_limit(&mut self) -> SegmenterStatus {
        match &self.phase {
            Phase::Recording { recorded, .. } if recorded.len() >= self.phrase_limit_samples => {
                debug!("Phrase limit reached");
                self.close()
            }
            _ => SegmenterStatus::Recording,
        }
    }

    fn close(&mut self) -> SegmenterStatus {
        match self.finish() {
            Some(samples) => SegmenterStatus::Complete(samples),
            None => SegmenterStatus::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHUNK: usize = 512;

    fn quick_config() -> CaptureConfig {
        CaptureConfig {
            ambient_duration_secs: 0.0,
            pause_duration_secs: 0.0625,
            pre_roll_secs: 0.0625,
            ..Default::default()
        }
    }

    fn loud() -> Vec<f32> {
        vec![0.5; CHUNK]
    }

    fn silent() -> Vec<f32> {
        vec![0.0; CHUNK]
    }

    #[test]
    fn test_times_out_without_onset() {
        let mut seg = UtteranceSegmenter::new(&quick_config(), Duration::from_millis(100));

        // 100ms = 1600 samples: three chunks wait, the fourth crosses the bound
        for _ in 0..3 {
            assert_eq!(seg.push_chunk(&silent(), false), SegmenterStatus::Waiting);
        }
        assert_eq!(seg.push_chunk(&silent(), false), SegmenterStatus::TimedOut);
        assert_eq!(seg.push_chunk(&loud(), true), SegmenterStatus::Closed);
    }

    #[test]
    fn test_phrase_ends_after_pause() {
        let mut seg = UtteranceSegmenter::new(&quick_config(), Duration::from_secs(5));

        assert_eq!(seg.push_chunk(&loud(), true), SegmenterStatus::Recording);
        assert_eq!(seg.push_chunk(&loud(), true), SegmenterStatus::Recording);
        // Pause is 1000 samples: two silent chunks end the phrase
        assert_eq!(seg.push_chunk(&silent(), false), SegmenterStatus::Recording);
        match seg.push_chunk(&silent(), false) {
            SegmenterStatus::Complete(samples) => assert_eq!(samples.len(), 4 * CHUNK),
            other => panic!("expected complete, got {:?}", other),
        }
    }

    #[test]
    fn test_pre_roll_is_prepended() {
        let mut seg = UtteranceSegmenter::new(&quick_config(), Duration::from_secs(5));

        // Quiet lead-in, below the energy floor
        let quiet = vec![0.001; CHUNK];
        for _ in 0..4 {
            seg.push_chunk(&quiet, false);
        }
        seg.push_chunk(&loud(), true);

        let samples = seg.finish().unwrap();
        // 62.5ms pre-roll = 1000 samples, then the onset chunk
        assert_eq!(samples.len(), 1000 + CHUNK);
        assert_eq!(samples[0], 0.001);
        assert_eq!(*samples.last().unwrap(), 0.5);
    }

    #[test]
    fn test_phrase_limit() {
        let config = CaptureConfig {
            phrase_limit_secs: 0.1,
            ..quick_config()
        };
        let mut seg = UtteranceSegmenter::new(&config, Duration::from_secs(5));

        let mut status = SegmenterStatus::Waiting;
        for _ in 0..10 {
            status = seg.push_chunk(&loud(), true);
            if matches!(status, SegmenterStatus::Complete(_)) {
                break;
            }
        }
        match status {
            SegmenterStatus::Complete(samples) => assert!(samples.len() >= 1600),
            other => panic!("expected complete, got {:?}", other),
        }
    }

    #[test]
    fn test_calibration_raises_noise_floor() {
        let config = CaptureConfig {
            ambient_duration_secs: 0.0625,
            ..quick_config()
        };
        let mut seg = UtteranceSegmenter::new(&config, Duration::from_secs(5));

        let hum = vec![0.1; CHUNK];
        assert_eq!(seg.push_chunk(&hum, true), SegmenterStatus::Calibrating);
        assert_eq!(seg.push_chunk(&hum, true), SegmenterStatus::Waiting);
        assert!((seg.noise_floor() - 0.15).abs() < 0.001);

        // VAD fires but the chunk is no louder than the hum
        assert_eq!(seg.push_chunk(&hum, true), SegmenterStatus::Waiting);
        assert_eq!(seg.push_chunk(&loud(), true), SegmenterStatus::Recording);
    }

    #[test]
    fn test_finish_before_onset() {
        let mut seg = UtteranceSegmenter::new(&quick_config(), Duration::from_secs(5));
        seg.push_chunk(&silent(), false);
        assert!(seg.finish().is_none());
    }

    #[test]
    fn test_infinite_timeout_is_config_error() {
        let config = CaptureConfig {
            timeout_secs: f32::INFINITY,
            ..Default::default()
        };
        assert!(matches!(config.timeout(), Err(TalkbackError::Config(_))));
        assert!(matches!(config.validate(), Err(TalkbackError::Config(_))));
    }

    #[test]
    fn test_out_of_range_durations_rejected() {
        for config in [
            CaptureConfig {
                phrase_limit_secs: 1e30,
                ..Default::default()
            },
            CaptureConfig {
                pre_roll_secs: -1.0,
                ..Default::default()
            },
            CaptureConfig {
                pause_duration_secs: f32::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(TalkbackError::Config(_))));
        }
        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn test_recording_budget() {
        let config = CaptureConfig {
            ambient_duration_secs: 0.5,
            phrase_limit_secs: 10.0,
            ..Default::default()
        };
        assert_eq!(config.recording_budget().unwrap(), Duration::from_millis(10_500));
    }
}
