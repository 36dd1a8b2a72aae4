//! Matcha acoustic backends: a shared two-session pipeline (acoustic
//! model → Vocos vocoder → ISTFT → post-processing) specialized by
//! three tokenizers — Chinese, English, and bilingual.

pub mod en;
pub mod zh;
pub mod zh_en;

use std::sync::Mutex;
use std::time::Instant;

use ndarray::{Array2, Array3, Ix3};
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use crate::assets;
use crate::audio::processor::{self, ProcessConfig};
use crate::backends::{apply_gain, empty_result, init_session, package_result};
use crate::config::{BackendKind, TtsConfig};
use crate::dsp::istft::{istft, IstftConfig};
use crate::error::{Result, TtsError};
use crate::text::espeak;
use crate::text::normalizer::{self, Language};
use crate::text::tokens::{self, TokenMap};
use crate::types::SynthesisResult;

struct Sessions {
    acoustic: Session,
    vocoder: Session,
}

struct MatchaState {
    // One mutex serializes both sessions; drop order releases them
    // before the token map.
    sessions: Mutex<Sessions>,
    tokens: TokenMap,
    /// Chinese variant only: jieba segmenter plus lexicon.
    zh_tokenizer: Option<zh::ZhTokenizer>,
    pad_id: i64,
    num_speakers: i32,
    native_rate: u32,
    istft: IstftConfig,
}

pub struct MatchaBackend {
    kind: BackendKind,
    config: TtsConfig,
    state: Option<MatchaState>,
    speed: f32,
    speaker: i32,
    gain: f32,
}

impl MatchaBackend {
    pub fn new(kind: BackendKind, config: TtsConfig) -> Self {
        let speed = config.speech_rate;
        let speaker = config.speaker_id;
        let gain = config.volume as f32 / 100.0;
        Self {
            kind,
            config,
            state: None,
            speed,
            speaker,
            gain,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(TtsError::AlreadyInitialized);
        }
        self.config.validate()?;

        let model_dir = assets::resolve_model_dir(self.kind, self.config.model_dir.as_deref());
        assets::ensure_matcha_assets(self.kind, &model_dir)?;
        let paths = assets::matcha_paths(self.kind, &model_dir);

        let acoustic = init_session(&paths.acoustic_model, self.config.num_threads)?;
        let vocoder = init_session(&paths.vocoder, self.config.num_threads)?;

        let tokens = if self.kind == BackendKind::MatchaZhEn {
            tokens::read_bilingual_token_map(&paths.tokens)?
        } else {
            tokens::read_token_map(&paths.tokens)?
        };

        let pad_id = metadata_i64(&acoustic, "pad_id", 0);
        let istft_config = IstftConfig {
            n_fft: metadata_i64(&vocoder, "n_fft", 1024) as usize,
            hop_length: metadata_i64(&vocoder, "hop_length", 256) as usize,
            win_length: metadata_i64(&vocoder, "win_length", 1024) as usize,
        };

        let zh_tokenizer = match self.kind {
            BackendKind::MatchaZh => Some(zh::ZhTokenizer::new(paths.lexicon.as_deref())?),
            _ => {
                // English and bilingual paths phonemize through
                // espeak-ng; fail fast when it is missing.
                if !espeak::is_available() {
                    return Err(TtsError::EspeakNotFound);
                }
                None
            }
        };

        let state = MatchaState {
            sessions: Mutex::new(Sessions { acoustic, vocoder }),
            tokens,
            zh_tokenizer,
            pad_id,
            num_speakers: 1,
            native_rate: self.kind.native_sample_rate(),
            istft: istft_config,
        };

        if self.config.enable_warmup {
            let started = Instant::now();
            let small = [1i64, 2, 3];
            let warmup_tokens = if self.uses_blank_tokens() {
                add_blank_tokens(&small, state.pad_id)
            } else {
                small.to_vec()
            };
            match run_acoustic(&state, &warmup_tokens, self.config.noise_scale, 1.0) {
                Ok(_) => log::info!("Matcha models warmed up in {:?}", started.elapsed()),
                Err(e) => log::warn!("Matcha warm-up failed: {e}"),
            }
        }

        log::info!("{} backend initialized", self.name());
        self.state = Some(state);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.state = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            BackendKind::MatchaZh => "Matcha-TTS (Chinese)",
            BackendKind::MatchaEn => "Matcha-TTS (English)",
            _ => "Matcha-TTS (Chinese-English)",
        }
    }

    /// Blank insertion applies to the monolingual models only.
    fn uses_blank_tokens(&self) -> bool {
        self.kind != BackendKind::MatchaZhEn
    }

    fn normalize_language(&self) -> Language {
        match self.kind {
            BackendKind::MatchaZh => Language::Zh,
            BackendKind::MatchaEn => Language::En,
            _ => Language::Auto,
        }
    }

    pub fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        let state = self.state.as_ref().ok_or(TtsError::NotInitialized)?;
        if text.is_empty() {
            return Err(TtsError::InvalidText("empty text".into()));
        }

        let started = Instant::now();
        let normalized = normalizer::normalize(text, self.normalize_language());

        let token_ids = match self.kind {
            BackendKind::MatchaZh => state
                .zh_tokenizer
                .as_ref()
                .map(|t| t.token_ids(&state.tokens, &normalized))
                .unwrap_or_default(),
            BackendKind::MatchaEn => en::token_ids(&state.tokens, &normalized),
            _ => zh_en::token_ids(&state.tokens, &normalized),
        };
        if token_ids.is_empty() {
            return Ok(empty_result(self.sample_rate()));
        }

        let final_tokens = if self.uses_blank_tokens() {
            add_blank_tokens(&token_ids, state.pad_id)
        } else {
            token_ids
        };

        let (mel, mel_dim) = run_acoustic(state, &final_tokens, self.config.noise_scale, self.speed)?;
        if mel.is_empty() {
            return Ok(empty_result(self.sample_rate()));
        }

        let mut samples = run_vocoder(state, &mel, mel_dim)?;

        let mut output_rate = state.native_rate;
        if self.config.output_sample_rate > 0 && self.config.output_sample_rate != state.native_rate
        {
            samples = processor::resample(&samples, state.native_rate, self.config.output_sample_rate);
            output_rate = self.config.output_sample_rate;
        }

        let mut samples = processor::process(
            samples,
            &ProcessConfig {
                target_rms: self.config.target_rms,
                use_rms_norm: self.config.use_rms_norm,
                compression_ratio: self.config.compression_ratio,
                compression_threshold: self.config.compression_threshold,
                remove_clicks: self.config.remove_clicks,
            },
        );
        apply_gain(&mut samples, self.gain);

        Ok(package_result(text, samples, output_rate, started))
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if speed <= 0.0 || speed > 10.0 {
            return Err(TtsError::InvalidConfig(
                "speed must be between 0.1 and 10.0".into(),
            ));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn set_speaker(&mut self, speaker_id: i32) -> Result<()> {
        if speaker_id < 0 {
            return Err(TtsError::InvalidConfig(
                "speaker id must be non-negative".into(),
            ));
        }
        let num_speakers = self.num_speakers();
        if speaker_id >= num_speakers {
            return Err(TtsError::InvalidConfig(format!(
                "speaker id {speaker_id} out of range (model has {num_speakers})"
            )));
        }
        self.speaker = speaker_id;
        Ok(())
    }

    pub fn set_volume(&mut self, gain: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(TtsError::InvalidConfig("volume gain must be 0-1".into()));
        }
        self.gain = gain;
        Ok(())
    }

    pub fn sample_rate(&self) -> u32 {
        if self.config.output_sample_rate > 0 {
            return self.config.output_sample_rate;
        }
        self.state
            .as_ref()
            .map(|s| s.native_rate)
            .unwrap_or_else(|| self.kind.native_sample_rate())
    }

    pub fn num_speakers(&self) -> i32 {
        self.state.as_ref().map(|s| s.num_speakers).unwrap_or(1)
    }
}

/// `[pad, t1, pad, t2, ..., tn, pad]` — length `2n + 1`, every even
/// index is the pad id.
pub(crate) fn add_blank_tokens(tokens: &[i64], pad_id: i64) -> Vec<i64> {
    let mut result = vec![pad_id; tokens.len() * 2 + 1];
    for (i, &token) in tokens.iter().enumerate() {
        result[i * 2 + 1] = token;
    }
    result
}

fn metadata_i64(session: &Session, key: &str, default: i64) -> i64 {
    session
        .metadata()
        .ok()
        .and_then(|meta| meta.custom(key).ok().flatten())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Drive the acoustic session: `x`, `x_length`, `noise_scale`,
/// `length_scale` in, flattened `mel` out along with its row count.
fn run_acoustic(
    state: &MatchaState,
    tokens: &[i64],
    noise_scale: f32,
    speed: f32,
) -> Result<(Vec<f32>, usize)> {
    let x = Array2::from_shape_vec((1, tokens.len()), tokens.to_vec())?;
    let x_length = ndarray::arr1(&[tokens.len() as i64]);
    let noise = ndarray::arr1(&[noise_scale]);
    let length_scale = ndarray::arr1(&[1.0f32 / speed]);

    let mut sessions = state
        .sessions
        .lock()
        .map_err(|_| TtsError::Internal("poisoned inference lock".into()))?;
    let outputs = sessions.acoustic.run(inputs![
        "x" => TensorRef::from_array_view(x.view())?,
        "x_length" => TensorRef::from_array_view(x_length.view())?,
        "noise_scale" => TensorRef::from_array_view(noise.view())?,
        "length_scale" => TensorRef::from_array_view(length_scale.view())?,
    ])?;

    let (_, mel_value) = outputs
        .iter()
        .find(|(name, _)| *name == "mel")
        .ok_or_else(|| TtsError::SynthesisFailed("acoustic model output 'mel' missing".into()))?;
    let mel = mel_value.try_extract_array::<f32>()?;
    let mel_dim = if mel.ndim() == 3 { mel.shape()[1] } else { 80 };
    Ok((mel.iter().copied().collect(), mel_dim))
}

/// Drive the vocoder and fold its `mag`/`x`/`y` outputs through the
/// inverse STFT: `real[t,k] = mag[k,t] * x[k,t]`,
/// `imag[t,k] = mag[k,t] * y[k,t]`.
fn run_vocoder(state: &MatchaState, mel: &[f32], mel_dim: usize) -> Result<Vec<f32>> {
    let num_frames = mel.len() / mel_dim;
    let mels = Array3::from_shape_vec((1, mel_dim, num_frames), mel.to_vec())?;

    let (real, imag, frames, n_bins) = {
        let mut sessions = state
            .sessions
            .lock()
            .map_err(|_| TtsError::Internal("poisoned inference lock".into()))?;
        let outputs = sessions.vocoder.run(inputs![
            "mels" => TensorRef::from_array_view(mels.view())?,
        ])?;

        let mut mag = None;
        let mut x = None;
        let mut y = None;
        for (name, value) in outputs.iter() {
            match name {
                "mag" => mag = Some(value),
                "x" => x = Some(value),
                "y" => y = Some(value),
                _ => {}
            }
        }
        let missing = || TtsError::SynthesisFailed("vocoder outputs 'mag'/'x'/'y' missing".into());
        let mag_val = mag.ok_or_else(missing)?;
        let x_val = x.ok_or_else(missing)?;
        let y_val = y.ok_or_else(missing)?;
        let mag = mag_val.try_extract_array::<f32>()?.into_dimensionality::<Ix3>()?;
        let x = x_val.try_extract_array::<f32>()?.into_dimensionality::<Ix3>()?;
        let y = y_val.try_extract_array::<f32>()?.into_dimensionality::<Ix3>()?;

        let n_bins = mag.shape()[1];
        let frames = mag.shape()[2];

        let mut real = vec![0.0f32; frames * n_bins];
        let mut imag = vec![0.0f32; frames * n_bins];
        for t in 0..frames {
            for k in 0..n_bins {
                let magnitude = mag[[0, k, t]];
                real[t * n_bins + k] = magnitude * x[[0, k, t]];
                imag[t * n_bins + k] = magnitude * y[[0, k, t]];
            }
        }
        (real, imag, frames, n_bins)
    };

    Ok(istft(&real, &imag, frames, n_bins, &state.istft))
}
