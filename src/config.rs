use std::path::PathBuf;

use crate::error::{Result, TtsError};

/// The synthesis pipelines this crate can drive.
///
/// The last three identifiers are reserved for models the factory does
/// not construct yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Chinese Matcha acoustic model + Vocos vocoder, 22050 Hz.
    MatchaZh,
    /// English Matcha acoustic model + Vocos vocoder, 22050 Hz.
    MatchaEn,
    /// Bilingual Chinese-English Matcha model, 16000 Hz.
    MatchaZhEn,
    /// Kokoro end-to-end model, 24000 Hz.
    Kokoro,
    CosyVoice,
    Vits,
    Piper,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::MatchaZh => "matcha-zh",
            BackendKind::MatchaEn => "matcha-en",
            BackendKind::MatchaZhEn => "matcha-zh-en",
            BackendKind::Kokoro => "kokoro",
            BackendKind::CosyVoice => "cosyvoice",
            BackendKind::Vits => "vits",
            BackendKind::Piper => "piper",
        }
    }

    /// The rate the underlying model emits before any resampling.
    pub fn native_sample_rate(self) -> u32 {
        match self {
            BackendKind::MatchaZhEn => 16000,
            BackendKind::Kokoro => 24000,
            _ => 22050,
        }
    }
}

/// Engine configuration. Immutable after engine construction except for
/// the dynamic setters (speed, speaker, volume).
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub backend: BackendKind,
    /// Model directory; `None` resolves to the per-backend cache dir.
    pub model_dir: Option<PathBuf>,
    /// Kokoro voice name, e.g. `"zf_xiaobei"`.
    pub voice: String,
    pub speaker_id: i32,
    /// Speech speed multiplier; > 1.0 is faster.
    pub speech_rate: f32,
    /// Stored but not threaded into inference by any current backend.
    pub pitch: f32,
    /// Matcha acoustic model variation control.
    pub noise_scale: f32,
    pub sample_rate: u32,
    /// Resample target; 0 disables resampling.
    pub output_sample_rate: u32,
    /// Linear output level, 0-100. 100 is unity.
    pub volume: u32,
    pub target_rms: f32,
    pub compression_ratio: f32,
    pub compression_threshold: f32,
    pub use_rms_norm: bool,
    pub remove_clicks: bool,
    pub num_threads: usize,
    pub enable_warmup: bool,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::MatchaZh,
            model_dir: None,
            voice: "default".to_string(),
            speaker_id: 0,
            speech_rate: 1.0,
            pitch: 1.0,
            noise_scale: 1.0,
            sample_rate: 22050,
            output_sample_rate: 0,
            volume: 100,
            target_rms: 0.15,
            compression_ratio: 2.0,
            compression_threshold: 0.5,
            use_rms_norm: true,
            remove_clicks: true,
            num_threads: 2,
            enable_warmup: true,
        }
    }
}

impl TtsConfig {
    pub fn matcha_zh() -> Self {
        Self {
            backend: BackendKind::MatchaZh,
            sample_rate: 22050,
            ..Self::default()
        }
    }

    pub fn matcha_en() -> Self {
        Self {
            backend: BackendKind::MatchaEn,
            sample_rate: 22050,
            ..Self::default()
        }
    }

    pub fn matcha_zh_en() -> Self {
        Self {
            backend: BackendKind::MatchaZhEn,
            sample_rate: 16000,
            ..Self::default()
        }
    }

    pub fn kokoro(voice: &str) -> Self {
        Self {
            backend: BackendKind::Kokoro,
            voice: voice.to_string(),
            sample_rate: 24000,
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speech_rate = speed;
        self
    }

    pub fn with_speaker(mut self, speaker_id: i32) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    pub fn with_volume(mut self, volume: u32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    pub fn with_output_sample_rate(mut self, rate: u32) -> Self {
        self.output_sample_rate = rate;
        self
    }

    pub fn with_warmup(mut self, enable: bool) -> Self {
        self.enable_warmup = enable;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(TtsError::InvalidConfig("sample rate must be positive".into()));
        }
        if self.speech_rate <= 0.0 {
            return Err(TtsError::InvalidConfig("speech rate must be positive".into()));
        }
        if self.speaker_id < 0 {
            return Err(TtsError::InvalidConfig("speaker id must be non-negative".into()));
        }
        if self.volume > 100 {
            return Err(TtsError::InvalidConfig("volume must be 0-100".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_pick_native_rates() {
        assert_eq!(TtsConfig::matcha_zh().sample_rate, 22050);
        assert_eq!(TtsConfig::matcha_zh_en().sample_rate, 16000);
        assert_eq!(TtsConfig::kokoro("zf_xiaobei").sample_rate, 24000);
        assert_eq!(TtsConfig::kokoro("zf_xiaobei").voice, "zf_xiaobei");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(TtsConfig::matcha_zh().validate().is_ok());
        assert!(TtsConfig::matcha_zh().with_speed(0.0).validate().is_err());
        assert!(TtsConfig::matcha_zh().with_speaker(-1).validate().is_err());
        assert!(TtsConfig::matcha_zh().with_volume(101).validate().is_err());
    }
}
