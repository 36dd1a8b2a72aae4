//! Text-side building blocks shared by all backends: script
//! classification, number readings, the normalizer passes, token-file
//! readers, IPA rewriting, and the espeak-ng bridge.

pub mod espeak;
pub mod normalizer;
pub mod numbers;
pub mod phonemes;
pub mod pinyin;
pub mod tokens;
pub mod utils;
