use std::sync::Mutex;
use std::time::Instant;

use ndarray::Array2;
use ort::inputs;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::KokoroPhonemizer;
use super::voices::{VoiceStyle, STYLE_DIM};
use crate::assets;
use crate::audio::processor::{self, ProcessConfig};
use crate::backends::{apply_gain, empty_result, init_session, package_result};
use crate::config::{BackendKind, TtsConfig};
use crate::error::{Result, TtsError};
use crate::types::SynthesisResult;

/// Fixed Kokoro output rate; the backend never resamples.
pub const SAMPLE_RATE: u32 = 24000;

struct KokoroState {
    // Sessions drop before the maps behind them; field order is the
    // drop order.
    session: Mutex<Session>,
    phonemizer: KokoroPhonemizer,
    voice: VoiceStyle,
}

pub struct KokoroBackend {
    config: TtsConfig,
    state: Option<KokoroState>,
    speed: f32,
    gain: f32,
}

impl KokoroBackend {
    pub fn new(config: TtsConfig) -> Self {
        let speed = config.speech_rate;
        let gain = config.volume as f32 / 100.0;
        Self {
            config,
            state: None,
            speed,
            gain,
        }
    }

    pub fn initialize(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(TtsError::AlreadyInitialized);
        }
        self.config.validate()?;

        let model_dir =
            assets::resolve_model_dir(BackendKind::Kokoro, self.config.model_dir.as_deref());
        let voice_name = if self.config.voice.is_empty() {
            "default"
        } else {
            self.config.voice.as_str()
        };
        assets::ensure_kokoro_assets(&model_dir, voice_name)?;

        let voice = VoiceStyle::load(&assets::kokoro_voice_path(&model_dir, voice_name))?;
        let session = init_session(
            &assets::kokoro_model_path(&model_dir),
            self.config.num_threads,
        )?;
        let phonemizer = KokoroPhonemizer::new();

        let state = KokoroState {
            session: Mutex::new(session),
            phonemizer,
            voice,
        };

        if self.config.enable_warmup {
            let started = Instant::now();
            // pad, 'a', 'n', pad
            let tokens = [0i64, 43, 56, 0];
            let style = state.voice.style_vector(tokens.len());
            match run_inference(&state.session, &tokens, style, 1.0) {
                Ok(_) => log::info!("Kokoro warmed up in {:?}", started.elapsed()),
                Err(e) => log::warn!("Kokoro warm-up failed: {e}"),
            }
        }

        log::info!("Kokoro backend initialized with voice {voice_name:?}");
        self.state = Some(state);
        Ok(())
    }

    pub fn shutdown(&mut self) {
        self.state = None;
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn synthesize(&self, text: &str) -> Result<SynthesisResult> {
        let state = self.state.as_ref().ok_or(TtsError::NotInitialized)?;
        if text.is_empty() {
            return Err(TtsError::InvalidText("empty text".into()));
        }

        let started = Instant::now();
        let token_ids = state.phonemizer.text_to_token_ids(text);
        if token_ids.is_empty() {
            return Ok(empty_result(SAMPLE_RATE));
        }

        let style = state.voice.style_vector(token_ids.len());
        // The session expects the inverse of the speech rate.
        let inverse_speed = 1.0 / self.speed;
        let samples = run_inference(&state.session, &token_ids, style, inverse_speed)?;
        if samples.is_empty() {
            return Ok(empty_result(SAMPLE_RATE));
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

        Ok(package_result(text, samples, SAMPLE_RATE, started))
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
        if speaker_id != 0 {
            return Err(TtsError::InvalidConfig(
                "Kokoro selects voices by name, not speaker id".into(),
            ));
        }
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
        SAMPLE_RATE
    }

    pub fn num_speakers(&self) -> i32 {
        1
    }
}

fn run_inference(
    session: &Mutex<Session>,
    tokens: &[i64],
    style: &[f32],
    speed: f32,
) -> Result<Vec<f32>> {
    let ids = Array2::from_shape_vec((1, tokens.len()), tokens.to_vec())?;
    let style_view = ndarray::ArrayView2::from_shape((1, STYLE_DIM), style)?;
    let speed_arr = ndarray::arr1(&[speed]);

    let mut session = session
        .lock()
        .map_err(|_| TtsError::Internal("poisoned inference lock".into()))?;
    let outputs = session.run(inputs![
        "input_ids" => TensorRef::from_array_view(ids.view())?,
        "style" => TensorRef::from_array_view(style_view)?,
        "speed" => TensorRef::from_array_view(speed_arr.view())?,
    ])?;

    let (_, value) = outputs
        .iter()
        .find(|(name, _)| *name == "waveform")
        .ok_or_else(|| TtsError::SynthesisFailed("model output 'waveform' missing".into()))?;
    let waveform = value.try_extract_array::<f32>()?;
    Ok(waveform.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_guards() {
        let backend = KokoroBackend::new(TtsConfig::kokoro("zf_xiaobei"));
        assert!(!backend.is_initialized());
        let err = backend.synthesize("你好").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotInitialized);
    }

    #[test]
    fn invalid_speed_does_not_mutate() {
        let mut backend = KokoroBackend::new(TtsConfig::kokoro("zf_xiaobei"));
        assert!(backend.set_speed(0.0).is_err());
        assert!(backend.set_speed(11.0).is_err());
        assert_eq!(backend.speed, 1.0);
        backend.set_speed(2.0).unwrap();
        assert_eq!(backend.speed, 2.0);
    }

    #[test]
    fn speaker_ids_other_than_zero_are_rejected() {
        let mut backend = KokoroBackend::new(TtsConfig::kokoro("zf_xiaobei"));
        assert!(backend.set_speaker(0).is_ok());
        assert!(backend.set_speaker(1).is_err());
    }

    #[test]
    fn fixed_output_rate() {
        let backend = KokoroBackend::new(TtsConfig::kokoro("zf_xiaobei"));
        assert_eq!(backend.sample_rate(), 24000);
        assert_eq!(backend.num_speakers(), 1);
    }
}
