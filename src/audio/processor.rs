//! Post-processing chain: dynamic-range compression, loudness
//! normalization with a soft knee, click and DC-offset removal, and a
//! linear resampler.

/// Knobs for the post-processing chain.
#[derive(Debug, Clone, Copy)]
pub struct ProcessConfig {
    pub target_rms: f32,
    pub use_rms_norm: bool,
    pub compression_ratio: f32,
    pub compression_threshold: f32,
    pub remove_clicks: bool,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            target_rms: 0.15,
            use_rms_norm: true,
            compression_ratio: 2.0,
            compression_threshold: 0.5,
            remove_clicks: true,
        }
    }
}

pub fn rms(audio: &[f32]) -> f32 {
    if audio.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = audio.iter().map(|s| s * s).sum();
    (sum_squares / audio.len() as f32).sqrt()
}

/// Remap magnitudes above the threshold: `a -> t + (a - t) / ratio`,
/// sign preserved.
pub fn compress(audio: &mut [f32], threshold: f32, ratio: f32) {
    for sample in audio.iter_mut() {
        let magnitude = sample.abs();
        if magnitude > threshold {
            let squeezed = threshold + (magnitude - threshold) / ratio;
            *sample = squeezed.copysign(*sample);
        }
    }
}

/// RMS normalization toward `target_rms` (gain capped at 3x) followed
/// by a soft knee at 0.95, or plain peak normalization to 0.8.
pub fn normalize(audio: &mut [f32], config: &ProcessConfig) {
    if audio.is_empty() {
        return;
    }

    if config.use_rms_norm {
        let current = rms(audio);
        if current > 0.0 {
            let scale = (config.target_rms / current).min(3.0);
            for sample in audio.iter_mut() {
                *sample *= scale;
            }
            for sample in audio.iter_mut() {
                let magnitude = sample.abs();
                if magnitude > 0.95 {
                    let knee = 0.95 + 0.05 * ((magnitude - 0.95) * 20.0).tanh();
                    *sample = knee.copysign(*sample);
                }
            }
        }
    } else {
        let peak = audio.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            let scale = 0.8 / peak;
            for sample in audio.iter_mut() {
                *sample *= scale;
            }
        }
    }
}

/// DC-offset removal, cosine fades at both ends, a single-pole
/// DC-blocking high-pass, and a forced-zero final sample.
pub fn remove_clicks(audio: &mut [f32]) {
    if audio.is_empty() {
        return;
    }

    let mean = audio.iter().sum::<f32>() / audio.len() as f32;
    if mean.abs() > 0.01 {
        for sample in audio.iter_mut() {
            *sample -= mean;
        }
    }

    // ~2 ms fade-in, ~5 ms fade-out at 22050 Hz.
    let fade_in = 44.min(audio.len() / 100);
    for i in 0..fade_in {
        let t = i as f32 / fade_in as f32;
        audio[i] *= 0.5 * (1.0 - (std::f32::consts::PI * t).cos());
    }

    let fade_out = 110.min(audio.len() / 50);
    let len = audio.len();
    for i in 0..fade_out {
        let t = i as f32 / fade_out as f32;
        audio[len - 1 - i] *= 0.5 * (1.0 - (std::f32::consts::PI * t).cos());
    }

    if audio.len() > 1 {
        let cutoff = 0.999;
        let mut prev_input = 0.0f32;
        let mut prev_output = 0.0f32;
        for sample in audio.iter_mut() {
            let input = *sample;
            let output = cutoff * (prev_output + input - prev_input);
            *sample = output;
            prev_input = input;
            prev_output = output;
        }
    }

    if let Some(last) = audio.last_mut() {
        *last = 0.0;
    }
}

/// Full chain: compression, normalization, optional click removal.
pub fn process(mut audio: Vec<f32>, config: &ProcessConfig) -> Vec<f32> {
    if audio.is_empty() {
        return audio;
    }

    compress(
        &mut audio,
        config.compression_threshold,
        config.compression_ratio,
    );
    normalize(&mut audio, config);
    if config.remove_clicks {
        remove_clicks(&mut audio);
    }

    audio
}

/// Linear-interpolation resampler. Identity when the rates match;
/// out-of-range reads clamp to the last sample or zero-fill.
pub fn resample(audio: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if audio.is_empty() || src_rate == dst_rate || dst_rate == 0 {
        return audio.to_vec();
    }

    let ratio = dst_rate as f64 / src_rate as f64;
    let output_len = (audio.len() as f64 * ratio) as usize;
    let mut out = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let src_idx = src_pos as usize;
        let frac = (src_pos - src_idx as f64) as f32;

        let sample = if src_idx + 1 < audio.len() {
            audio[src_idx] * (1.0 - frac) + audio[src_idx + 1] * frac
        } else if src_idx < audio.len() {
            audio[src_idx]
        } else {
            0.0
        };
        out.push(sample);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_constant_signal() {
        assert_eq!(rms(&[]), 0.0);
        assert!((rms(&[0.5; 100]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn compression_only_touches_loud_samples() {
        let mut audio = vec![0.3, 0.9, -0.9, 0.5];
        compress(&mut audio, 0.5, 2.0);
        assert_eq!(audio[0], 0.3);
        assert!((audio[1] - 0.7).abs() < 1e-6);
        assert!((audio[2] + 0.7).abs() < 1e-6);
        assert_eq!(audio[3], 0.5);
    }

    #[test]
    fn soft_knee_keeps_output_below_one() {
        // Quiet signal with loud spikes: the RMS gain pushes the spikes
        // well past full scale, and the knee must fold them back.
        let mut audio = vec![0.01f32; 1000];
        audio[200] = 2.0;
        audio[600] = -2.0;
        let config = ProcessConfig {
            remove_clicks: false,
            ..ProcessConfig::default()
        };
        let audio = process(audio, &config);
        for &sample in &audio {
            assert!(sample.abs() <= 1.0, "sample escaped the knee: {sample}");
        }
    }

    #[test]
    fn peak_normalization_targets_point_eight() {
        let mut audio = vec![0.1, -0.4, 0.2];
        let config = ProcessConfig {
            use_rms_norm: false,
            ..ProcessConfig::default()
        };
        normalize(&mut audio, &config);
        let peak = audio.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.8).abs() < 1e-6);
    }

    #[test]
    fn click_removal_zeroes_the_tail() {
        let mut audio = vec![0.2; 4096];
        remove_clicks(&mut audio);
        assert_eq!(*audio.last().unwrap(), 0.0);
        // The fade-in starts from silence.
        assert!(audio[0].abs() < 1e-6);
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let audio = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&audio, 22050, 22050), audio);
    }

    #[test]
    fn resample_halving_shortens_output() {
        let audio: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample(&audio, 44100, 22050);
        assert_eq!(out.len(), 50);
        // Linear interpolation of a ramp stays on the ramp.
        assert!((out[10] - audio[20]).abs() < 1e-6);
    }

    #[test]
    fn empty_audio_passes_through() {
        assert!(process(Vec::new(), &ProcessConfig::default()).is_empty());
    }
}
