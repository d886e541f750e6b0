use crate::audio::preprocessor::{downmix_to_mono, finish_capture};
use crate::audio::resampler::AudioResampler;
use crate::audio::segmenter::{CaptureConfig, SegmenterStatus, UtteranceSegmenter};
use crate::audio::vad::VoiceActivityDetector;
use crate::audio::{AudioClip, SpeechCapture, CAPTURE_SAMPLE_RATE};
use crate::{Result, TalkbackError};
use chrono::Utc;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Extra wall-clock slack on top of the audio-time limits, for stalled devices
const DEVICE_STALL_GRACE: Duration = Duration::from_secs(2);

/// Default input device, opened for one utterance at a time
pub struct Microphone {
    device: Device,
    stream_config: StreamConfig,
    config: CaptureConfig,
    vad: VoiceActivityDetector,
}

impl Microphone {
    /// Open the default input device
    pub fn new(config: CaptureConfig) -> Result<Self> {
        config.validate()?;

        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| TalkbackError::AudioDevice("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let stream_config = device
            .default_input_config()
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to get input config: {}", e)))?
            .into();

        let vad = VoiceActivityDetector::new(CAPTURE_SAMPLE_RATE, config.vad_threshold)?;

        Ok(Self {
            device,
            stream_config,
            config,
            vad,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream_config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.stream_config.channels
    }

    fn save_recording(&self, clip: &AudioClip) {
        let Some(dir) = &self.config.recordings_dir else {
            return;
        };

        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Cannot create recordings directory {:?}: {}", dir, e);
            return;
        }

        let path = dir.join(format!("capture-{}.wav", Utc::now().format("%Y%m%d-%H%M%S%.3f")));
        if let Err(e) = clip.save_wav(&path) {
            warn!("Failed to save recording: {}", e);
        }
    }
}

impl SpeechCapture for Microphone {
    fn capture(&mut self, timeout: Duration) -> Result<AudioClip> {
        let device_rate = self.sample_rate();
        let channels = self.channels();
        let (audio_tx, audio_rx) = bounded::<Vec<f32>>(256);

        let err_fn = |err| {
            error!("Audio input stream error: {}", err);
        };

        // Dropped on every return path below, which closes the device
        let stream = self
            .device
            .build_input_stream(
                &self.stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mono = downmix_to_mono(data, channels);
                    if let Err(e) = audio_tx.try_send(mono) {
                        debug!("Dropping input audio: {}", e);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to start input stream: {}", e)))?;

        info!("Listening ({}Hz, {} channels)", device_rate, channels);

        self.vad.reset();
        let mut segmenter = UtteranceSegmenter::new(&self.config, timeout);
        let mut resampler = if device_rate != CAPTURE_SAMPLE_RATE {
            Some(AudioResampler::new(device_rate, CAPTURE_SAMPLE_RATE, 1)?)
        } else {
            None
        };

        let chunk_size = self.vad.chunk_size();
        let mut raw_pending: Vec<f32> = Vec::new();
        let mut pending: Vec<f32> = Vec::new();

        let deadline =
            Instant::now() + self.config.recording_budget()? + timeout + DEVICE_STALL_GRACE;

        let samples = loop {
            let raw = match audio_rx.recv_timeout(Duration::from_millis(200)) {
                Ok(raw) => raw,
                Err(RecvTimeoutError::Timeout) => {
                    if Instant::now() >= deadline {
                        match segmenter.finish() {
                            Some(samples) => break samples,
                            None => return Err(TalkbackError::CaptureTimeout(timeout.as_secs_f32())),
                        }
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TalkbackError::AudioDevice("Input stream closed".into()));
                }
            };

            match resampler.as_mut() {
                Some(resampler) => {
                    raw_pending.extend_from_slice(&raw);
                    let chunk_len = resampler.chunk_len();
                    while raw_pending.len() >= chunk_len {
                        let block: Vec<f32> = raw_pending.drain(..chunk_len).collect();
                        pending.extend(resampler.process_chunk(&block)?);
                    }
                }
                None => pending.extend_from_slice(&raw),
            }

            let mut finished = None;
            while pending.len() >= chunk_size {
                let chunk: Vec<f32> = pending.drain(..chunk_size).collect();
                let vad_speech = self.vad.is_speech(&chunk);

                match segmenter.push_chunk(&chunk, vad_speech) {
                    SegmenterStatus::Complete(samples) => {
                        finished = Some(samples);
                        break;
                    }
                    SegmenterStatus::TimedOut => {
                        return Err(TalkbackError::CaptureTimeout(timeout.as_secs_f32()));
                    }
                    _ => {}
                }
            }

            if let Some(samples) = finished {
                break samples;
            }
        };

        drop(stream);

        if samples.is_empty() {
            return Err(TalkbackError::Recognition("Captured audio was empty".into()));
        }

        let clip = AudioClip::new(finish_capture(&samples), CAPTURE_SAMPLE_RATE);
        info!("Captured {:.2}s of speech", clip.duration_seconds());
        self.save_recording(&clip);

        Ok(clip)
    }
}
