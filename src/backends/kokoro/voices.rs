//! Kokoro voice styles: a raw little-endian float32 matrix of shape
//! `(N, 256)`, one row per possible token length.

use std::fs;
use std::path::Path;

use crate::error::{Result, TtsError};

/// Style vector dimension for Kokoro.
pub const STYLE_DIM: usize = 256;

/// All style vectors of one voice.
pub struct VoiceStyle {
    data: Vec<f32>,
    rows: usize,
}

impl VoiceStyle {
    /// Load a `voices/<name>.bin` blob. The byte length must be a
    /// non-zero multiple of `256 * 4`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| TtsError::ModelNotFound(format!("{}: {e}", path.display())))?;

        if bytes.is_empty() || bytes.len() % (STYLE_DIM * 4) != 0 {
            return Err(TtsError::ModelNotFound(format!(
                "{}: invalid voice file size {} (not a multiple of {})",
                path.display(),
                bytes.len(),
                STYLE_DIM * 4
            )));
        }

        let data: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let rows = data.len() / STYLE_DIM;

        log::info!("loaded voice {} ({rows} style vectors)", path.display());
        Ok(Self { data, rows })
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    /// Row selected by token length, clamped into range so any length
    /// is safe.
    pub fn style_vector(&self, token_len: usize) -> &[f32] {
        let row = token_len.min(self.rows - 1);
        &self.data[row * STYLE_DIM..(row + 1) * STYLE_DIM]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_voice(name: &str, rows: usize) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = fs::File::create(&path).unwrap();
        for row in 0..rows {
            for _ in 0..STYLE_DIM {
                file.write_all(&(row as f32).to_le_bytes()).unwrap();
            }
        }
        path
    }

    #[test]
    fn loads_and_indexes_rows() {
        let path = write_voice("polytts_voice_ok.bin", 3);
        let voice = VoiceStyle::load(&path).unwrap();
        assert_eq!(voice.num_rows(), 3);
        assert_eq!(voice.style_vector(0)[0], 0.0);
        assert_eq!(voice.style_vector(1)[255], 1.0);
        // Clamped: any out-of-range length lands on the last row.
        assert_eq!(voice.style_vector(999)[0], 2.0);
    }

    #[test]
    fn rejects_misaligned_files() {
        let path = std::env::temp_dir().join("polytts_voice_bad.bin");
        fs::write(&path, [0u8; 1000]).unwrap();
        assert!(VoiceStyle::load(&path).is_err());

        let empty = std::env::temp_dir().join("polytts_voice_empty.bin");
        fs::write(&empty, []).unwrap();
        assert!(VoiceStyle::load(&empty).is_err());
    }
}
