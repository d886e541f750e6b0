use crate::audio::resampler::resample_audio;
use crate::audio::CAPTURE_SAMPLE_RATE;
use crate::Result;
use tracing::debug;

/// Average interleaved frames down to one channel
pub fn downmix_to_mono(input: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return input.to_vec();
    }

    input
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Normalize audio to a peak amplitude of 0.95
pub fn normalize_audio(samples: &[f32]) -> Vec<f32> {
    let peak = samples.iter().fold(0.0f32, |max, s| max.max(s.abs()));

    if peak == 0.0 || peak.is_nan() {
        return samples.to_vec();
    }

    let gain = 0.95 / peak;
    samples.iter().map(|&s| s * gain).collect()
}

/// Remove the DC offset by subtracting the mean
pub fn remove_dc_offset(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }

    let mean: f32 = samples.iter().sum::<f32>() / samples.len() as f32;
    samples.iter().map(|&s| s - mean).collect()
}

/// Root mean square level of a block of samples
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|&s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Turn arbitrary interleaved audio into a Whisper-ready 16kHz mono clip
pub fn prepare_clip(input: &[f32], input_sample_rate: u32, channels: u16) -> Result<Vec<f32>> {
    debug!(
        "Preparing clip: {} samples, {}Hz, {} channels",
        input.len(),
        input_sample_rate,
        channels
    );

    let mono = downmix_to_mono(input, channels);
    let resampled = resample_audio(&mono, input_sample_rate, CAPTURE_SAMPLE_RATE, 1)?;
    let normalized = normalize_audio(&remove_dc_offset(&resampled));

    debug!("Clip ready: {} samples at 16kHz", normalized.len());

    Ok(normalized)
}

/// Tidy an already-16kHz mono capture before transcription
pub fn finish_capture(samples: &[f32]) -> Vec<f32> {
    normalize_audio(&remove_dc_offset(samples))
}
