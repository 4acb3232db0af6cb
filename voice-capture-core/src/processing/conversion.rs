//! Sample-format helpers shared by the capture backends and the sink.

/// Downmix interleaved multi-channel audio to mono by averaging channels
/// per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}

/// Linear-interpolation resampling for mono audio.
///
/// Returns the input unchanged if the rates already match.
pub fn resample_linear(samples: &[f32], source_rate: f64, target_rate: f64) -> Vec<f32> {
    if (source_rate - target_rate).abs() < 0.01 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = target_rate / source_rate;
    let output_count = (samples.len() as f64 * ratio) as usize;
    if output_count == 0 {
        return Vec::new();
    }

    let mut output = vec![0.0f32; output_count];
    for (i, sample) in output.iter_mut().enumerate() {
        let source_index = i as f64 / ratio;
        let index = source_index as usize;
        let fraction = (source_index - index as f64) as f32;

        if index + 1 < samples.len() {
            *sample = samples[index] * (1.0 - fraction) + samples[index + 1] * fraction;
        } else if index < samples.len() {
            *sample = samples[index];
        }
    }
    output
}

/// Convert normalized f32 samples `[-1.0, 1.0]` to signed 16-bit values.
///
/// Out-of-range values are clamped.
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Serialize 16-bit samples as little-endian PCM bytes.
pub fn pcm16_bytes(samples: &[i16]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        data.extend_from_slice(&sample.to_le_bytes());
    }
    data
}
