//! Model asset provisioning: cache directory layout, on-demand download
//! of model archives, and extraction.
//!
//! Transfers shell out to the system `curl` and `tar`, the same way the
//! phonemizer shells out to espeak-ng. The rest of the crate only ever
//! consumes the resolved file paths.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::BackendKind;
use crate::error::{Result, TtsError};

const ARCHIVE_BASE_URL: &str = "https://archive.spacemit.com/spacemit-ai/openwebui";
const KOKORO_BASE_URL: &str =
    "https://huggingface.co/onnx-community/Kokoro-82M-v1.0-ONNX/resolve/main";

/// `$HOME/.cache`, or `./.cache` when HOME is unset.
pub fn cache_root() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".cache"),
        None => PathBuf::from("./.cache"),
    }
}

/// The per-family cache directory used when the config does not pin a
/// model directory.
pub fn default_model_dir(kind: BackendKind) -> PathBuf {
    let family = match kind {
        BackendKind::Kokoro => "kokoro-tts",
        _ => "matcha-tts",
    };
    cache_root().join(family)
}

pub fn resolve_model_dir(kind: BackendKind, configured: Option<&Path>) -> PathBuf {
    match configured {
        Some(dir) => dir.to_path_buf(),
        None => default_model_dir(kind),
    }
}

/// Resolved on-disk layout for one Matcha variant.
pub struct MatchaPaths {
    pub acoustic_model: PathBuf,
    pub tokens: PathBuf,
    pub lexicon: Option<PathBuf>,
    pub vocoder: PathBuf,
}

fn matcha_subdir(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::MatchaZh => "matcha-icefall-zh-baker",
        BackendKind::MatchaEn => "matcha-icefall-en_US-ljspeech",
        _ => "matcha-icefall-zh-en",
    }
}

pub fn matcha_paths(kind: BackendKind, model_dir: &Path) -> MatchaPaths {
    let subdir = model_dir.join(matcha_subdir(kind));
    match kind {
        BackendKind::MatchaZh => MatchaPaths {
            acoustic_model: subdir.join("model-steps-3.onnx"),
            tokens: subdir.join("tokens.txt"),
            lexicon: Some(subdir.join("lexicon.txt")),
            vocoder: model_dir.join("vocos-22khz-univ.onnx"),
        },
        BackendKind::MatchaEn => MatchaPaths {
            acoustic_model: subdir.join("model-steps-3.onnx"),
            tokens: subdir.join("tokens.txt"),
            lexicon: None,
            vocoder: model_dir.join("vocos-22khz-univ.onnx"),
        },
        _ => MatchaPaths {
            acoustic_model: subdir.join("model-steps-3.onnx"),
            tokens: subdir.join("vocab_tts.txt"),
            lexicon: None,
            vocoder: model_dir.join("vocos-16khz-univ.onnx"),
        },
    }
}

pub fn kokoro_model_path(model_dir: &Path) -> PathBuf {
    model_dir.join("kokoro-v1.0.onnx")
}

pub fn kokoro_voice_path(model_dir: &Path, voice: &str) -> PathBuf {
    model_dir.join("voices").join(format!("{voice}.bin"))
}

/// Fetch anything missing for a Matcha variant: the shared vocoder as a
/// bare `.onnx`, the language model as a `.tar.gz` unpacked in place.
pub fn ensure_matcha_assets(kind: BackendKind, model_dir: &Path) -> Result<()> {
    fs::create_dir_all(model_dir)?;
    let paths = matcha_paths(kind, model_dir);

    if !paths.vocoder.exists() {
        let name = match kind {
            BackendKind::MatchaZhEn => "vocos-16khz-univ.onnx",
            _ => "vocos-22khz-univ.onnx",
        };
        download_file(&format!("{ARCHIVE_BASE_URL}/{name}"), &paths.vocoder)?;
    }

    if !paths.acoustic_model.exists() || !paths.tokens.exists() {
        let subdir = matcha_subdir(kind);
        let archive = model_dir.join(format!("{subdir}.tar.gz"));
        download_file(&format!("{ARCHIVE_BASE_URL}/{subdir}.tar.gz"), &archive)?;
        let extracted = extract_tar_gz(&archive, model_dir);
        let _ = fs::remove_file(&archive);
        extracted?;
    }

    Ok(())
}

/// Fetch the Kokoro model and the requested voice blob if missing.
pub fn ensure_kokoro_assets(model_dir: &Path, voice: &str) -> Result<()> {
    fs::create_dir_all(model_dir.join("voices"))?;

    let model = kokoro_model_path(model_dir);
    if !model.exists() {
        download_file(&format!("{KOKORO_BASE_URL}/onnx/model.onnx"), &model)?;
    }

    let voice_path = kokoro_voice_path(model_dir, voice);
    if !voice_path.exists() {
        download_file(&format!("{KOKORO_BASE_URL}/voices/{voice}.bin"), &voice_path)?;
    }

    Ok(())
}

fn download_file(url: &str, dest: &Path) -> Result<()> {
    log::info!("downloading {url} -> {}", dest.display());
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("curl")
        .args(["--location", "--fail", "--silent", "--show-error", "--output"])
        .arg(dest)
        .arg(url)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TtsError::ConnectionFailed("curl not found on PATH".into())
            } else {
                TtsError::Io(e)
            }
        })?;

    if !output.status.success() {
        let _ = fs::remove_file(dest);
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TtsError::FetchFailed(format!("{url}: {}", stderr.trim())));
    }

    Ok(())
}

fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let output = Command::new("tar")
        .arg("-xzf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TtsError::Internal(format!(
            "failed to extract {}: {}",
            archive.display(),
            stderr.trim()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dirs_split_by_family() {
        assert!(default_model_dir(BackendKind::MatchaZh).ends_with("matcha-tts"));
        assert!(default_model_dir(BackendKind::Kokoro).ends_with("kokoro-tts"));
    }

    #[test]
    fn configured_dir_wins() {
        let dir = resolve_model_dir(BackendKind::MatchaZh, Some(Path::new("/opt/models")));
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn matcha_layout_matches_cache_contract() {
        let dir = Path::new("/cache/matcha-tts");
        let zh = matcha_paths(BackendKind::MatchaZh, dir);
        assert!(zh
            .acoustic_model
            .ends_with("matcha-icefall-zh-baker/model-steps-3.onnx"));
        assert!(zh.lexicon.is_some());
        assert!(zh.vocoder.ends_with("vocos-22khz-univ.onnx"));

        let zh_en = matcha_paths(BackendKind::MatchaZhEn, dir);
        assert!(zh_en.tokens.ends_with("matcha-icefall-zh-en/vocab_tts.txt"));
        assert!(zh_en.lexicon.is_none());
        assert!(zh_en.vocoder.ends_with("vocos-16khz-univ.onnx"));
    }

    #[test]
    fn kokoro_layout() {
        let dir = Path::new("/cache/kokoro-tts");
        assert!(kokoro_model_path(dir).ends_with("kokoro-v1.0.onnx"));
        assert!(kokoro_voice_path(dir, "zf_xiaobei").ends_with("voices/zf_xiaobei.bin"));
    }
}
