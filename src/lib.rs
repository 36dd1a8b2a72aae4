//! # polytts
//!
//! Offline text-to-speech for Chinese, English, and code-switched
//! Chinese-English input. All acoustic inference runs on the local CPU
//! through ONNX Runtime; the only network activity is a one-shot,
//! cached download of the pretrained model assets.
//!
//! ## Backends
//!
//! - **Matcha-ZH** — Chinese acoustic model + Vocos vocoder, 22050 Hz
//! - **Matcha-EN** — English acoustic model + Vocos vocoder, 22050 Hz
//! - **Matcha-ZH-EN** — bilingual acoustic model, 16000 Hz
//! - **Kokoro** — end-to-end model, 24000 Hz
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::path::Path;
//! use polytts::{TtsConfig, TtsEngine};
//!
//! let engine = TtsEngine::new(TtsConfig::matcha_zh())?;
//! engine.call_to_file("你好世界", Path::new("hello.wav"))?;
//! # Ok::<(), polytts::TtsError>(())
//! ```
//!
//! ## System Requirements
//!
//! **espeak-ng** must be installed for the English, bilingual, and
//! Kokoro-English paths:
//! - **Linux**: `sudo apt-get install espeak-ng`
//! - **macOS**: `brew install espeak-ng`
//! - **Windows**: <https://espeak-ng.org/download>
//!
//! Model files are fetched on first use into `~/.cache/matcha-tts/`
//! and `~/.cache/kokoro-tts/`, or read from a configured model
//! directory.

pub mod assets;
pub mod audio;
pub mod backends;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod text;
pub mod types;

pub use config::{BackendKind, TtsConfig};
pub use engine::TtsEngine;
pub use error::{ErrorKind, Result, TtsError};
pub use types::{AudioChunk, SentenceInfo, SynthesisResult, TtsCallback};
