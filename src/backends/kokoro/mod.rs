//! Kokoro end-to-end backend: one ONNX session turns padded token ids,
//! a 256-float style vector, and an inverse speed scalar directly into
//! a 24 kHz waveform. No vocoder, no ISTFT, no blank insertion.

pub mod backend;
pub mod phonemizer;
pub mod voices;

pub use backend::KokoroBackend;
pub use phonemizer::KokoroPhonemizer;
pub use voices::VoiceStyle;
