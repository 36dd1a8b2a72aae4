//! Overlap-add inverse short-time Fourier transform.
//!
//! The vocoder emits magnitude and phase components per frame; this
//! module folds them back into a waveform with a Hann window and
//! window-energy compensation.

use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

/// ISTFT geometry, read from the vocoder model metadata.
#[derive(Debug, Clone, Copy)]
pub struct IstftConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub win_length: usize,
}

impl Default for IstftConfig {
    fn default() -> Self {
        Self {
            n_fft: 1024,
            hop_length: 256,
            win_length: 1024,
        }
    }
}

/// Symmetric Hann window: `w[i] = 0.5 * (1 - cos(2*pi*i / (len - 1)))`,
/// zero at both ends.
pub fn hann_window(length: usize) -> Vec<f32> {
    if length <= 1 {
        return vec![0.0; length];
    }
    (0..length)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (length - 1) as f32).cos())
        })
        .collect()
}

/// Reconstruct audio from per-frame real and imaginary spectra.
///
/// `real` and `imag` are row-major `[num_frames, n_bins]` with
/// `n_bins = n_fft / 2 + 1`. Output length is
/// `n_fft + (num_frames - 1) * hop_length`.
pub fn istft(
    real: &[f32],
    imag: &[f32],
    num_frames: usize,
    n_bins: usize,
    config: &IstftConfig,
) -> Vec<f32> {
    let IstftConfig {
        n_fft,
        hop_length,
        win_length,
    } = *config;

    if num_frames == 0 || n_fft == 0 {
        return Vec::new();
    }

    let audio_len = n_fft + (num_frames - 1) * hop_length;
    let mut audio = vec![0.0f32; audio_len];
    let mut window_energy = vec![0.0f32; audio_len];
    let window = hann_window(win_length);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_inverse(n_fft);
    let mut spectrum = vec![Complex32::new(0.0, 0.0); n_fft];
    let scale = 1.0 / n_fft as f32;

    for frame in 0..num_frames {
        let row = frame * n_bins;

        // Rebuild the full conjugate-symmetric spectrum so the inverse
        // transform of the half-spectrum yields a real signal.
        spectrum.fill(Complex32::new(0.0, 0.0));
        let usable_bins = n_bins.min(n_fft / 2 + 1);
        for k in 0..usable_bins {
            let c = Complex32::new(real[row + k], imag[row + k]);
            spectrum[k] = c;
            if k > 0 && k < n_fft - k {
                spectrum[n_fft - k] = c.conj();
            }
        }

        fft.process(&mut spectrum);

        let start = frame * hop_length;
        for i in 0..n_fft {
            let mut sample = spectrum[i].re * scale;
            if i < win_length {
                sample *= window[i];
            }
            if start + i < audio_len {
                audio[start + i] += sample;
                if i < win_length {
                    window_energy[start + i] += window[i] * window[i];
                }
            }
        }
    }

    for (sample, energy) in audio.iter_mut().zip(window_energy.iter()) {
        if *energy > 1e-8 {
            *sample /= energy;
        }
    }

    audio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_is_symmetric_and_zero_at_ends() {
        let w = hann_window(16);
        assert_eq!(w[0], 0.0);
        assert_eq!(w[15], 0.0);
        for i in 0..16 {
            assert!((w[i] - w[15 - i]).abs() < 1e-6);
        }
        assert!((w[7] - w[8]).abs() < 0.05);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let config = IstftConfig::default();
        assert!(istft(&[], &[], 0, 513, &config).is_empty());
    }

    #[test]
    fn single_frame_single_bin_reconstructs_cosine() {
        // One frame with energy only in bin 4 must come back as a
        // cosine at 4 cycles per n_fft samples (before windowing).
        let n_fft = 64;
        let n_bins = n_fft / 2 + 1;
        let config = IstftConfig {
            n_fft,
            hop_length: 16,
            win_length: n_fft,
        };

        let bin = 4;
        let mut real = vec![0.0f32; n_bins];
        let imag = vec![0.0f32; n_bins];
        // Half-spectrum convention: interior bins carry half the
        // amplitude because the conjugate bin carries the rest.
        real[bin] = n_fft as f32 / 2.0;

        let audio = istft(&real, &imag, 1, n_bins, &config);
        assert_eq!(audio.len(), n_fft);

        let window = hann_window(n_fft);
        for (i, &sample) in audio.iter().enumerate() {
            let expected_raw =
                (2.0 * std::f32::consts::PI * bin as f32 * i as f32 / n_fft as f32).cos();
            // Window energy compensation divides by w^2 where the
            // window is above the floor; below it the windowed sample
            // remains.
            let energy = window[i] * window[i];
            let expected = if energy > 1e-8 {
                expected_raw / window[i]
            } else {
                expected_raw * window[i]
            };
            let tolerance = 1e-3 * expected.abs().max(1.0);
            assert!(
                (sample - expected).abs() < tolerance,
                "sample {i}: {sample} vs {expected}"
            );
        }
    }

    #[test]
    fn output_length_follows_frame_count() {
        let config = IstftConfig {
            n_fft: 32,
            hop_length: 8,
            win_length: 32,
        };
        let n_bins = 17;
        let frames = 5;
        let real = vec![0.0f32; frames * n_bins];
        let imag = vec![0.0f32; frames * n_bins];
        let audio = istft(&real, &imag, frames, n_bins, &config);
        assert_eq!(audio.len(), 32 + 4 * 8);
    }
}
