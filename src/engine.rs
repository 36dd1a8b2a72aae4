//! The engine façade: owns one backend, exposes blocking synthesis,
//! WAV export, the single-event streaming wrapper, and the dynamic
//! setters.

use std::path::Path;

use crate::backends::{self, Backend};
use crate::config::{BackendKind, TtsConfig};
use crate::error::{Result, TtsError};
use crate::types::{AudioChunk, SynthesisResult, TtsCallback};

/// One synthesis engine bound to one backend.
///
/// ```no_run
/// use polytts::{TtsConfig, TtsEngine};
///
/// let engine = TtsEngine::new(TtsConfig::matcha_zh())?;
/// let result = engine.call("你好世界")?;
/// println!("{} ms of audio", result.audio_duration_ms);
/// # Ok::<(), polytts::TtsError>(())
/// ```
pub struct TtsEngine {
    backend: Backend,
    config: TtsConfig,
}

impl std::fmt::Debug for TtsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtsEngine").field("config", &self.config).finish_non_exhaustive()
    }
}

impl TtsEngine {
    /// Build and initialize the backend for `config.backend`.
    pub fn new(config: TtsConfig) -> Result<Self> {
        config.validate()?;

        let mut backend = backends::create(config.backend, config.clone()).ok_or_else(|| {
            TtsError::InvalidConfig(format!(
                "unsupported backend kind: {}",
                config.backend.as_str()
            ))
        })?;
        backend.initialize()?;

        Ok(Self { backend, config })
    }

    /// Synthesize one utterance, blocking the caller's thread.
    pub fn call(&self, text: &str) -> Result<SynthesisResult> {
        self.backend.synthesize(text)
    }

    /// Synthesize and write a 16-bit mono PCM WAV.
    pub fn call_to_file(&self, text: &str, path: &Path) -> Result<SynthesisResult> {
        let result = self.call(text)?;
        if result.audio.is_empty() {
            return Err(TtsError::FileWrite("no audio to write".into()));
        }
        write_wav(path, &result.audio)?;
        Ok(result)
    }

    /// Degenerate streaming: `on_open`, the one synthesized result as
    /// `on_event`, then `on_complete` (or `on_error`), then `on_close`.
    pub fn streaming_call(&self, text: &str, callback: &dyn TtsCallback) {
        callback.on_open();
        match self.call(text) {
            Ok(result) => {
                callback.on_event(&result);
                callback.on_complete();
            }
            Err(error) => callback.on_error(&error),
        }
        callback.on_close();
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.backend.set_speed(speed)?;
        self.config.speech_rate = speed;
        Ok(())
    }

    pub fn set_speaker(&mut self, speaker_id: i32) -> Result<()> {
        self.backend.set_speaker(speaker_id)?;
        self.config.speaker_id = speaker_id;
        Ok(())
    }

    /// Output level 0-100, applied as a linear gain.
    pub fn set_volume(&mut self, volume: u32) -> Result<()> {
        if volume > 100 {
            return Err(TtsError::InvalidConfig("volume must be 0-100".into()));
        }
        self.backend.set_volume(volume as f32 / 100.0)?;
        self.config.volume = volume;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        self.backend.sample_rate()
    }

    pub fn num_speakers(&self) -> i32 {
        self.backend.num_speakers()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn engine_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_initialized()
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    /// Release sessions and maps. Subsequent calls fail with
    /// `NotInitialized`.
    pub fn shutdown(&mut self) {
        self.backend.shutdown();
    }
}

/// RIFF/WAVE, PCM format tag 1, mono, 16 bits per sample,
/// little-endian.
pub(crate) fn write_wav(path: &Path, audio: &AudioChunk) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| TtsError::FileWrite(e.to_string()))?;
    for sample in audio.to_int16() {
        writer
            .write_sample(sample)
            .map_err(|e| TtsError::FileWrite(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| TtsError::FileWrite(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_backend_kinds_are_invalid_config() {
        let config = TtsConfig {
            backend: BackendKind::Vits,
            ..TtsConfig::default()
        };
        let err = TtsEngine::new(config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidConfig);
    }

    #[test]
    fn invalid_config_is_rejected_before_backend_creation() {
        let err = TtsEngine::new(TtsConfig::matcha_zh().with_speed(0.0)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidConfig);
    }

    #[test]
    fn wav_round_trip_is_byte_exact() {
        let chunk = AudioChunk::from_float(
            vec![0.0, 0.25, -0.25, 1.0, -1.0, 0.5, 2.0, -2.0],
            22050,
            true,
        );
        let path = std::env::temp_dir().join("polytts_wav_roundtrip.wav");
        write_wav(&path, &chunk).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, chunk.to_int16());
    }
}
