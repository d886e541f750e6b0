use crate::audio::resampler::resample_audio;
use crate::{Result, TalkbackError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, StreamConfig};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Time allowed for the device to pull the final buffer after the queue empties
const DRAIN_TAIL: Duration = Duration::from_millis(150);

/// Default output device, opened for one blocking playback at a time
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
}

impl AudioOutput {
    /// Open the default output device
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| TalkbackError::AudioDevice("No output device available".into()))?;

        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_output_config()
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to get output config: {}", e)))?
            .into();

        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Play mono samples and return once the device has consumed them
    pub fn play_blocking(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let samples = resample_audio(samples, sample_rate, self.sample_rate(), 1)?;
        let duration = Duration::from_secs_f32(samples.len() as f32 / self.sample_rate() as f32);
        let queue = Arc::new(Mutex::new(samples.into_iter().collect::<VecDeque<f32>>()));
        let channels = self.config.channels as usize;

        let callback_queue = Arc::clone(&queue);
        let err_fn = |err| {
            error!("Audio output stream error: {}", err);
        };

        // Scoped to this call: dropping it releases the device
        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut queue = callback_queue.lock();
                    for frame in data.chunks_mut(channels) {
                        let sample = queue.pop_front().unwrap_or(0.0);
                        frame.fill(sample);
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| TalkbackError::AudioDevice(format!("Failed to start output stream: {}", e)))?;

        debug!("Playing {:.2}s of audio", duration.as_secs_f32());

        // The queue should drain in roughly `duration`; give it generous slack
        let deadline = Instant::now() + duration * 2 + Duration::from_secs(1);
        while !queue.lock().is_empty() {
            if Instant::now() >= deadline {
                return Err(TalkbackError::AudioDevice(
                    "Output device stopped consuming audio".into(),
                ));
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        std::thread::sleep(DRAIN_TAIL);

        drop(stream);
        debug!("Playback finished");
        Ok(())
    }
}
