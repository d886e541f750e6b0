use crate::{Result, TalkbackError};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames per channel handed to rubato on every call
const CHUNK_FRAMES: usize = 1024;

/// Sinc resampler between two fixed rates
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
}

impl AudioResampler {
    /// Create a new audio resampler
    ///
    /// # Arguments
    /// * `input_rate` - Input sample rate
    /// * `output_rate` - Output sample rate
    /// * `channels` - Number of audio channels
    pub fn new(input_rate: u32, output_rate: u32, channels: u16) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(TalkbackError::Config(
                "Sample rates must be greater than 0".into(),
            ));
        }

        if channels == 0 {
            return Err(TalkbackError::Config(
                "Number of channels must be greater than 0".into(),
            ));
        }

        let resample_ratio = output_rate as f64 / input_rate as f64;

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            resample_ratio,
            2.0,
            params,
            CHUNK_FRAMES,
            channels as usize,
        )
        .map_err(|e| TalkbackError::AudioProcessing(format!("Failed to create resampler: {}", e)))?;

        debug!(
            "Created resampler: {} Hz -> {} Hz, {} channels",
            input_rate, output_rate, channels
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels: channels as usize,
        })
    }

    /// Number of interleaved samples `process_chunk` consumes per call
    pub fn chunk_len(&self) -> usize {
        self.resampler.input_frames_max() * self.channels
    }

    /// Resample exactly one full chunk, keeping filter state for the next one
    ///
    /// Used for streaming input where chunks are contiguous.
    pub fn process_chunk(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.len() != self.chunk_len() {
            return Err(TalkbackError::AudioProcessing(format!(
                "Expected {} samples per chunk, got {}",
                self.chunk_len(),
                input.len()
            )));
        }

        let frames = input.len() / self.channels;
        let planar = self.deinterleave(input, frames);
        let output = self
            .resampler
            .process(&planar, None)
            .map_err(|e| TalkbackError::AudioProcessing(format!("Resampling failed: {}", e)))?;

        Ok(Self::interleave(&output, output[0].len()))
    }

    /// Resample a complete buffer of arbitrary length
    ///
    /// The last partial chunk is zero-padded and the output trimmed to the
    /// proportional length.
    pub fn resample(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.resampler.input_frames_max();
        let total_frames = input.len() / self.channels;
        let ratio = self.output_rate as f64 / self.input_rate as f64;
        let mut output =
            Vec::with_capacity((total_frames as f64 * ratio * 1.1) as usize * self.channels);

        let mut frame_offset = 0;
        while frame_offset < total_frames {
            let frames_to_read = (total_frames - frame_offset).min(chunk_size);

            let mut input_planar = vec![vec![0.0f32; chunk_size]; self.channels];
            for frame_idx in 0..frames_to_read {
                let src_idx = (frame_offset + frame_idx) * self.channels;
                for (ch_idx, channel) in input_planar.iter_mut().enumerate() {
                    channel[frame_idx] = input[src_idx + ch_idx];
                }
            }

            let output_planar = self
                .resampler
                .process(&input_planar, None)
                .map_err(|e| TalkbackError::AudioProcessing(format!("Resampling failed: {}", e)))?;

            let output_frames = output_planar[0].len();
            let frames_to_take = if frames_to_read < chunk_size {
                ((frames_to_read as f64) * ratio).ceil() as usize
            } else {
                output_frames
            };

            output.extend(Self::interleave(
                &output_planar,
                frames_to_take.min(output_frames),
            ));
            frame_offset += frames_to_read;
        }

        debug!(
            "Resampled {} frames -> {} frames",
            total_frames,
            output.len() / self.channels
        );

        Ok(output)
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    fn deinterleave(&self, input: &[f32], frames: usize) -> Vec<Vec<f32>> {
        let mut planar = vec![Vec::with_capacity(frames); self.channels];
        for frame in input.chunks(self.channels) {
            for (ch_idx, &sample) in frame.iter().enumerate() {
                planar[ch_idx].push(sample);
            }
        }
        planar
    }

    fn interleave(planar: &[Vec<f32>], frames: usize) -> Vec<f32> {
        let mut output = Vec::with_capacity(frames * planar.len());
        for frame_idx in 0..frames {
            for channel in planar {
                output.push(channel[frame_idx]);
            }
        }
        output
    }
}

/// Resample a complete mono or interleaved buffer in one step
pub fn resample_audio(
    input: &[f32],
    input_rate: u32,
    output_rate: u32,
    channels: u16,
) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let mut resampler = AudioResampler::new(input_rate, output_rate, channels)?;
    resampler.resample(input)
}
