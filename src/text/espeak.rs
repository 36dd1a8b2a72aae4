//! Bridge to the external `espeak-ng` phonemizer.
//!
//! The utility is driven over stdin/stdout with `-q --ipa=3 -v en-us`;
//! its availability is probed once at backend init and the flag cached
//! process-wide.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use crate::error::{Result, TtsError};

static ESPEAK_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Probe espeak-ng with a no-op input. The result is cached for the
/// lifetime of the process.
pub fn is_available() -> bool {
    *ESPEAK_AVAILABLE.get_or_init(|| run_espeak("test").is_ok())
}

/// Convert English text to raw espeak IPA. Fails with `EspeakNotFound`
/// when the binary is missing from PATH.
pub fn text_to_ipa(text: &str) -> Result<String> {
    if text.is_empty() {
        return Ok(String::new());
    }
    let raw = run_espeak(text)?;
    Ok(clean_ipa(&raw))
}

fn run_espeak(input: &str) -> Result<String> {
    let mut child = Command::new("espeak-ng")
        .args(["-q", "--ipa=3", "-v", "en-us", "--stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TtsError::EspeakNotFound
            } else {
                TtsError::Io(e)
            }
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        // espeak-ng under-processes a final token without a trailing
        // line terminator.
        stdin.write_all(input.as_bytes())?;
        if !input.ends_with('\n') {
            stdin.write_all(b"\n")?;
        }
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TtsError::Internal(format!(
            "espeak-ng exited with code {:?}: {stderr}",
            output.status.code()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Strip newlines, syllable dots, and zero-width characters; collapse
/// runs of spaces; trim.
pub fn clean_ipa(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = false;

    for c in raw.chars() {
        match c {
            '\n' | '\r' | '.' => continue,
            '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => continue,
            ' ' => {
                if !last_was_space && !out.is_empty() {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            _ => {
                out.push(c);
                last_was_space = false;
            }
        }
    }

    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_whitespace_and_zero_width() {
        assert_eq!(clean_ipa("  həˈloʊ\n  wɜːld \r"), "həˈloʊ wɜːld");
        assert_eq!(clean_ipa("a\u{200d}b\u{feff}c"), "abc");
        assert_eq!(clean_ipa("ˈsɪl.ə.bəl"), "ˈsɪləbəl");
    }

    #[test]
    fn espeak_round_trip_when_installed() {
        // Skip silently when espeak-ng is unavailable in the execution
        // environment.
        if !is_available() {
            return;
        }
        let ipa = text_to_ipa("hello").expect("espeak should succeed");
        assert!(!ipa.is_empty());
        assert!(!ipa.contains('\n'));
    }
}
