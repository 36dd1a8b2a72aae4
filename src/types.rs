use crate::error::TtsError;

/// A block of mono float32 audio in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Default)]
pub struct AudioChunk {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Always 1; kept explicit for wire formats that carry a channel count.
    pub channels: u16,
    /// True when this chunk ends an utterance.
    pub is_final: bool,
    pub sentence_index: usize,
    /// Milliseconds, -1 when unknown.
    pub timestamp_ms: i64,
}

impl AudioChunk {
    pub fn from_float(samples: Vec<f32>, sample_rate: u32, is_final: bool) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
            is_final,
            sentence_index: 0,
            timestamp_ms: -1,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.samples.is_empty() || self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Clamp to `[-1, 1]` and scale to signed 16-bit.
    pub fn to_int16(&self) -> Vec<i16> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect()
    }

    /// PCM S16LE bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for sample in self.to_int16() {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }
}

/// Timing record for one input sentence.
#[derive(Debug, Clone)]
pub struct SentenceInfo {
    pub text: String,
    pub begin_time_ms: u64,
    pub end_time_ms: u64,
    pub is_final: bool,
}

/// The outcome of one synthesis request.
#[derive(Debug, Clone, Default)]
pub struct SynthesisResult {
    pub request_id: String,
    pub audio: AudioChunk,
    pub sentences: Vec<SentenceInfo>,
    pub audio_duration_ms: u64,
    pub processing_time_ms: u64,
    /// Real-time factor: processing time over audio duration.
    pub rtf: f32,
}

impl SynthesisResult {
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }

    pub fn text(&self) -> String {
        self.sentences.iter().map(|s| s.text.as_str()).collect()
    }

    pub(crate) fn finalize_rtf(&mut self) {
        if self.audio_duration_ms > 0 {
            self.rtf = self.processing_time_ms as f32 / self.audio_duration_ms as f32;
        } else {
            self.rtf = 0.0;
        }
    }
}

/// Observer for the pseudo-streaming call.
///
/// The engine synthesizes the whole utterance, then replays it as a
/// single event between `on_open` and `on_close`. Implementations own
/// their own state; the engine never retains the reference past the call.
pub trait TtsCallback {
    fn on_open(&self) {}
    fn on_event(&self, _result: &SynthesisResult) {}
    fn on_complete(&self) {}
    fn on_error(&self, _error: &TtsError) {}
    fn on_close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_sample_count() {
        let chunk = AudioChunk::from_float(vec![0.0; 22050], 22050, true);
        assert_eq!(chunk.duration_ms(), 1000);
        assert_eq!(AudioChunk::default().duration_ms(), 0);
    }

    #[test]
    fn int16_conversion_clamps() {
        let chunk = AudioChunk::from_float(vec![2.0, -2.0, 0.0, 1.0], 16000, true);
        let pcm = chunk.to_int16();
        assert_eq!(pcm, vec![32767, -32767, 0, 32767]);
    }

    #[test]
    fn bytes_are_little_endian() {
        let chunk = AudioChunk::from_float(vec![1.0], 16000, true);
        assert_eq!(chunk.to_bytes(), vec![0xFF, 0x7F]);
    }

    #[test]
    fn rtf_is_zero_for_empty_audio() {
        let mut result = SynthesisResult::default();
        result.processing_time_ms = 120;
        result.finalize_rtf();
        assert_eq!(result.rtf, 0.0);

        result.audio_duration_ms = 1000;
        result.finalize_rtf();
        assert!((result.rtf - 0.12).abs() < 1e-6);
    }
}
