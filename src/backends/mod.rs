//! Concrete synthesis backends and the factory that picks one.
//!
//! The engine owns exactly one [`Backend`]; the backend owns its ONNX
//! sessions, token maps, and helpers. A single mutex per backend
//! serializes inference, so concurrent callers block rather than fail.

pub mod kokoro;
pub mod matcha;

use std::path::Path;
use std::time::Instant;

use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

use crate::config::{BackendKind, TtsConfig};
use crate::error::{Result, TtsError};
use crate::types::{AudioChunk, SentenceInfo, SynthesisResult};

pub use kokoro::KokoroBackend;
pub use matcha::MatchaBackend;

/// One of the four concrete pipelines, dispatched as a tagged union.
pub enum Backend {
    Matcha(MatchaBackend),
    Kokoro(KokoroBackend),
}

impl Backend {
    pub fn initialize(&mut self) -> Result<()> {
        match self {
            Backend::Matcha(b) => b.initialize(),
            Backend::Kokoro(b) => b.initialize(),
        }
    }

    pub fn shutdown(&mut self) {
        match self {
            Backend::Matcha(b) => b.shutdown(),
            Backend::Kokoro(b) => b.shutdown(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        match self {
            Backend::Matcha(b) => b.is_initialized(),
            Backend::Kokoro(b) => b.is_initialized(),
        }
    }

    pub fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        match self {
            Backend::Matcha(b) => b.synthesize(text),
            Backend::Kokoro(b) => b.synthesize(text),
        }
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        match self {
            Backend::Matcha(b) => b.set_speed(speed),
            Backend::Kokoro(b) => b.set_speed(speed),
        }
    }

    pub fn set_speaker(&mut self, speaker_id: i32) -> Result<()> {
        match self {
            Backend::Matcha(b) => b.set_speaker(speaker_id),
            Backend::Kokoro(b) => b.set_speaker(speaker_id),
        }
    }

    /// Linear output gain in `[0, 1]`.
    pub fn set_volume(&mut self, gain: f32) -> Result<()> {
        match self {
            Backend::Matcha(b) => b.set_volume(gain),
            Backend::Kokoro(b) => b.set_volume(gain),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Backend::Matcha(b) => b.sample_rate(),
            Backend::Kokoro(b) => b.sample_rate(),
        }
    }

    pub fn num_speakers(&self) -> i32 {
        match self {
            Backend::Matcha(b) => b.num_speakers(),
            Backend::Kokoro(b) => b.num_speakers(),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Matcha(b) => b.kind(),
            Backend::Kokoro(_) => BackendKind::Kokoro,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Matcha(b) => b.name(),
            Backend::Kokoro(_) => "Kokoro-TTS v1.0 (Chinese/English)",
        }
    }

    /// The streaming wrapper emits one event per utterance; no backend
    /// streams incrementally.
    pub fn supports_streaming(&self) -> bool {
        false
    }
}

/// Construct the backend for `kind`, or `None` for the reserved
/// identifiers no pipeline implements yet.
pub fn create(kind: BackendKind, config: TtsConfig) -> Option<Backend> {
    match kind {
        BackendKind::MatchaZh | BackendKind::MatchaEn | BackendKind::MatchaZhEn => {
            Some(Backend::Matcha(MatchaBackend::new(kind, config)))
        }
        BackendKind::Kokoro => Some(Backend::Kokoro(KokoroBackend::new(config))),
        BackendKind::CosyVoice | BackendKind::Vits | BackendKind::Piper => None,
    }
}

pub fn is_available(kind: BackendKind) -> bool {
    matches!(
        kind,
        BackendKind::MatchaZh | BackendKind::MatchaEn | BackendKind::MatchaZhEn | BackendKind::Kokoro
    )
}

pub fn supported_kinds() -> &'static [BackendKind] {
    &[
        BackendKind::MatchaZh,
        BackendKind::MatchaEn,
        BackendKind::MatchaZhEn,
        BackendKind::Kokoro,
    ]
}

/// Load an ONNX session with full graph optimization on the CPU
/// provider, honoring the configured thread count.
pub(crate) fn init_session(path: &Path, num_threads: usize) -> Result<Session> {
    if !path.exists() {
        return Err(TtsError::ModelNotFound(path.display().to_string()));
    }

    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(vec![CPUExecutionProvider::default().build()])?;
    if num_threads > 0 {
        builder = builder.with_intra_threads(num_threads)?;
    }

    Ok(builder.commit_from_file(path)?)
}

/// Success with an empty audio buffer: phonemization produced nothing
/// speakable, which is not an error.
pub(crate) fn empty_result(sample_rate: u32) -> SynthesisResult {
    SynthesisResult {
        audio: AudioChunk::from_float(Vec::new(), sample_rate, true),
        ..SynthesisResult::default()
    }
}

/// Wrap finished samples with timing, RTF, and the single-sentence
/// record covering the whole utterance.
pub(crate) fn package_result(
    text: &str,
    samples: Vec<f32>,
    sample_rate: u32,
    started: Instant,
) -> SynthesisResult {
    let mut result = SynthesisResult {
        audio: AudioChunk::from_float(samples, sample_rate, true),
        ..SynthesisResult::default()
    };
    result.audio_duration_ms = result.audio.duration_ms();
    result.processing_time_ms = started.elapsed().as_millis() as u64;
    result.finalize_rtf();
    result.sentences.push(SentenceInfo {
        text: text.to_string(),
        begin_time_ms: 0,
        end_time_ms: result.audio_duration_ms,
        is_final: true,
    });
    result
}

pub(crate) fn apply_gain(samples: &mut [f32], gain: f32) {
    if (gain - 1.0).abs() > f32::EPSILON {
        for sample in samples.iter_mut() {
            *sample *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_kinds_are_unavailable() {
        assert!(is_available(BackendKind::MatchaZh));
        assert!(is_available(BackendKind::Kokoro));
        assert!(!is_available(BackendKind::CosyVoice));
        assert!(!is_available(BackendKind::Vits));
        assert!(create(BackendKind::Piper, TtsConfig::default()).is_none());
        assert_eq!(supported_kinds().len(), 4);
    }

    #[test]
    fn created_backends_start_uninitialized() {
        let backend = create(BackendKind::MatchaZh, TtsConfig::matcha_zh()).unwrap();
        assert!(!backend.is_initialized());
        assert_eq!(backend.kind(), BackendKind::MatchaZh);
        assert!(!backend.supports_streaming());
    }

    #[test]
    fn uninitialized_synthesis_is_rejected() {
        let backend = create(BackendKind::Kokoro, TtsConfig::kokoro("zf_xiaobei")).unwrap();
        let err = backend.synthesize("你好").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotInitialized);
    }

    #[test]
    fn packaged_result_carries_sentence_and_rtf() {
        let started = Instant::now();
        let result = package_result("你好", vec![0.0; 22050], 22050, started);
        assert_eq!(result.audio_duration_ms, 1000);
        assert_eq!(result.sentences.len(), 1);
        assert_eq!(result.sentences[0].text, "你好");
        assert!(result.sentences[0].is_final);
        assert!(result.audio.is_final);
    }

    #[test]
    fn gain_scales_samples() {
        let mut samples = vec![0.5, -0.5];
        apply_gain(&mut samples, 0.5);
        assert_eq!(samples, vec![0.25, -0.25]);
    }
}
