//! Kokoro phonemization: Chinese goes pinyin → IPA through static
//! tables, English goes through espeak-ng plus the Gruut US rewrite,
//! digits are normalized to Chinese first. The resulting IPA string is
//! tokenized one Unicode scalar at a time against a fixed vocabulary.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::text::espeak;
use crate::text::normalizer::{self, Language};
use crate::text::phonemes::to_gruut_en_us;
use crate::text::pinyin::hanzi_to_pinyin_tone3;
use crate::text::utils::{contains_cjk, is_cjk_char, map_cjk_punct_to_ascii};

/// Id 0 doubles as PAD and the start/end sentinel.
pub const PAD_TOKEN_ID: i64 = 0;

/// Hard cap on the padded token sequence.
pub const MAX_TOKEN_LEN: usize = 512;

/// The Kokoro v1.0 vocabulary: 114 entries with sparse ids up to 177,
/// tokenized per Unicode scalar.
const VOCAB_ENTRIES: &[(char, i64)] = &[
    (';', 1),
    (':', 2),
    (',', 3),
    ('.', 4),
    ('!', 5),
    ('?', 6),
    ('—', 9),
    ('…', 10),
    ('"', 11),
    ('(', 12),
    (')', 13),
    ('\u{201c}', 14),
    ('\u{201d}', 15),
    (' ', 16),
    ('\u{0303}', 17),
    ('ʣ', 18),
    ('ʥ', 19),
    ('ʦ', 20),
    ('ʨ', 21),
    ('ᵝ', 22),
    ('\u{ab67}', 23),
    ('A', 24),
    ('I', 25),
    ('O', 31),
    ('Q', 33),
    ('S', 35),
    ('T', 36),
    ('W', 39),
    ('Y', 41),
    ('ᵊ', 42),
    ('a', 43),
    ('b', 44),
    ('c', 45),
    ('d', 46),
    ('e', 47),
    ('f', 48),
    ('h', 50),
    ('i', 51),
    ('j', 52),
    ('k', 53),
    ('l', 54),
    ('m', 55),
    ('n', 56),
    ('o', 57),
    ('p', 58),
    ('q', 59),
    ('r', 60),
    ('s', 61),
    ('t', 62),
    ('u', 63),
    ('v', 64),
    ('w', 65),
    ('x', 66),
    ('y', 67),
    ('z', 68),
    ('ɑ', 69),
    ('ɐ', 70),
    ('ɒ', 71),
    ('æ', 72),
    ('β', 75),
    ('ɔ', 76),
    ('ɕ', 77),
    ('ç', 78),
    ('ɖ', 80),
    ('ð', 81),
    ('ʤ', 82),
    ('ə', 83),
    ('ɚ', 85),
    ('ɛ', 86),
    ('ɜ', 87),
    ('ɟ', 90),
    ('ɡ', 92),
    ('ɥ', 99),
    ('ɨ', 101),
    ('ɪ', 102),
    ('ʝ', 103),
    ('ɯ', 110),
    ('ɰ', 111),
    ('ŋ', 112),
    ('ɳ', 113),
    ('ɲ', 114),
    ('ɴ', 115),
    ('ø', 116),
    ('ɸ', 118),
    ('θ', 119),
    ('œ', 120),
    ('ɹ', 123),
    ('ɾ', 125),
    ('ɻ', 126),
    ('ʁ', 128),
    ('ɽ', 129),
    ('ʂ', 130),
    ('ʃ', 131),
    ('ʈ', 132),
    ('ʧ', 133),
    ('ʊ', 135),
    ('ʋ', 136),
    ('ʌ', 138),
    ('ɣ', 139),
    ('ɤ', 140),
    ('χ', 142),
    ('ʎ', 143),
    ('ʒ', 147),
    ('ʔ', 148),
    ('ˈ', 156),
    ('ˌ', 157),
    ('ː', 158),
    ('ʰ', 162),
    ('ʲ', 164),
    ('↓', 169),
    ('→', 171),
    ('↗', 172),
    ('↘', 173),
    ('ᵻ', 177),
];

static VOCAB: Lazy<HashMap<char, i64>> =
    Lazy::new(|| VOCAB_ENTRIES.iter().copied().collect());

/// Pinyin initials ordered for longest-match parsing: the two-character
/// retroflex initials must win over their one-character prefixes.
const INITIALS: &[&str] = &[
    "zh", "ch", "sh", "b", "p", "m", "f", "d", "t", "n", "l", "g", "k", "h", "j", "q", "x", "r",
    "z", "c", "s", "y", "w",
];

fn initial_to_ipa(initial: &str) -> Option<&'static str> {
    Some(match initial {
        "b" => "p",
        "p" => "pʰ",
        "m" => "m",
        "f" => "f",
        "d" => "t",
        "t" => "tʰ",
        "n" => "n",
        "l" => "l",
        "g" => "k",
        "k" => "kʰ",
        "h" => "x",
        "j" => "tɕ",
        "q" => "tɕʰ",
        "x" => "ɕ",
        "zh" => "ʈʂ",
        "ch" => "ʈʂʰ",
        "sh" => "ʂ",
        "r" => "ɻ",
        "z" => "ts",
        "c" => "tsʰ",
        "s" => "s",
        "y" => "j",
        "w" => "w",
        _ => return None,
    })
}

fn final_to_ipa(final_part: &str) -> Option<&'static str> {
    Some(match final_part {
        "a" => "a",
        "ai" => "ai",
        "an" => "an",
        "ang" => "aŋ",
        "ao" => "au",
        "e" => "ɤ",
        "ei" => "ei",
        "en" => "ən",
        "eng" => "əŋ",
        "er" => "əɻ",
        "i" => "i",
        "ia" => "ja",
        "ian" => "jɛn",
        "iang" => "jaŋ",
        "iao" => "jau",
        "ie" => "je",
        "in" => "in",
        "ing" => "iŋ",
        "iong" => "jʊŋ",
        "iu" => "jou",
        "o" => "o",
        "ong" => "ʊŋ",
        "ou" => "ou",
        "u" => "u",
        "ua" => "wa",
        "uai" => "wai",
        "uan" => "wan",
        "uang" => "waŋ",
        "ue" => "ɥe",
        "ui" => "wei",
        "un" => "wən",
        "uo" => "wo",
        "v" => "y",
        "ve" => "ɥe",
        "van" => "ɥɛn",
        "vn" => "yn",
        _ => return None,
    })
}

#[derive(Debug, Default, PartialEq, Eq)]
struct PinyinParts {
    initial: &'static str,
    final_part: String,
    tone: u8,
}

/// Split a numeric-tone pinyin syllable (e.g. `zhong1`) into initial,
/// final, and tone. Tone 0 means none was present.
fn parse_pinyin(pinyin: &str) -> PinyinParts {
    let mut parts = PinyinParts::default();
    let mut syllable = pinyin;

    if let Some(last) = syllable.chars().last() {
        if ('1'..='5').contains(&last) {
            parts.tone = last as u8 - b'0';
            syllable = &syllable[..syllable.len() - 1];
        }
    }

    for initial in INITIALS {
        if let Some(rest) = syllable.strip_prefix(initial) {
            parts.initial = initial;
            parts.final_part = rest.to_string();
            return parts;
        }
    }

    // Zero-initial syllable such as "a", "e", "an".
    parts.final_part = syllable.to_string();
    parts
}

fn tone_arrow(tone: u8) -> &'static str {
    match tone {
        1 => "→",
        2 => "↗",
        3 => "↓",
        4 => "↘",
        _ => "",
    }
}

/// Table-driven pinyin → IPA with the Mandarin special cases: syllabic
/// vowels after retroflex and dental sibilants, and the ü re-reading
/// after j/q/x.
pub fn pinyin_to_ipa(pinyin: &str) -> String {
    let parts = parse_pinyin(pinyin);
    let mut ipa = String::new();

    if parts.final_part == "i" {
        if matches!(parts.initial, "zh" | "ch" | "sh" | "r") {
            if let Some(initial) = initial_to_ipa(parts.initial) {
                ipa.push_str(initial);
            }
            ipa.push('ɻ');
            ipa.push_str(tone_arrow(parts.tone));
            return ipa;
        }
        if matches!(parts.initial, "z" | "c" | "s") {
            if let Some(initial) = initial_to_ipa(parts.initial) {
                ipa.push_str(initial);
            }
            ipa.push('ɹ');
            ipa.push_str(tone_arrow(parts.tone));
            return ipa;
        }
    }

    // After j/q/x a written "u" is the ü vowel.
    if matches!(parts.initial, "j" | "q" | "x") && parts.final_part.starts_with('u') {
        let adjusted = format!("v{}", &parts.final_part[1..]);
        if let Some(final_ipa) = final_to_ipa(&adjusted) {
            if let Some(initial) = initial_to_ipa(parts.initial) {
                ipa.push_str(initial);
            }
            ipa.push_str(final_ipa);
            ipa.push_str(tone_arrow(parts.tone));
            return ipa;
        }
    }

    if let Some(initial) = initial_to_ipa(parts.initial) {
        ipa.push_str(initial);
    }

    match final_to_ipa(&parts.final_part) {
        Some(final_ipa) => ipa.push_str(final_ipa),
        None => {
            // Character-by-character fallback keeps unknown finals
            // audible instead of dropping the syllable.
            for c in parts.final_part.chars() {
                match final_to_ipa(&c.to_string()) {
                    Some(mapped) => ipa.push_str(mapped),
                    None => ipa.push(c),
                }
            }
        }
    }

    ipa.push_str(tone_arrow(parts.tone));
    ipa
}

/// Text → Kokoro token ids via the combined IPA pipeline.
pub struct KokoroPhonemizer {
    espeak_available: bool,
}

impl KokoroPhonemizer {
    pub fn new() -> Self {
        let espeak_available = espeak::is_available();
        if espeak_available {
            log::info!("espeak-ng detected, English support enabled");
        } else {
            log::warn!("espeak-ng not found, English text will be skipped");
        }
        Self { espeak_available }
    }

    /// Produce the padded, truncated token-id sequence for `text`.
    /// An empty result means nothing in the input was speakable.
    pub fn text_to_token_ids(&self, text: &str) -> Vec<i64> {
        if text.is_empty() {
            return Vec::new();
        }

        let normalized = normalizer::normalize(text, Language::Zh);
        let chars: Vec<char> = normalized.chars().collect();
        let mut ipa = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if is_cjk_char(c) {
                let mut segment = String::new();
                while i < chars.len() && is_cjk_char(chars[i]) {
                    segment.push(chars[i]);
                    i += 1;
                }
                for syllable in hanzi_to_pinyin_tone3(&segment) {
                    ipa.push_str(&pinyin_to_ipa(&syllable));
                }
                continue;
            }

            if c.is_ascii_alphabetic() {
                let mut segment = String::new();
                while i < chars.len()
                    && (chars[i].is_ascii_alphabetic() || matches!(chars[i], ' ' | '\'' | '-'))
                {
                    segment.push(chars[i]);
                    i += 1;
                }
                let segment = segment.trim_end();
                if !segment.is_empty() {
                    ipa.push_str(&self.english_to_ipa(segment));
                }
                continue;
            }

            if c.is_ascii_digit() {
                let mut segment = String::new();
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    segment.push(chars[i]);
                    i += 1;
                }
                let spelled = normalizer::normalize(&segment, Language::Zh);
                if contains_cjk(&spelled) {
                    for syllable in hanzi_to_pinyin_tone3(&spelled) {
                        ipa.push_str(&pinyin_to_ipa(&syllable));
                    }
                }
                continue;
            }

            let mapped = map_cjk_punct_to_ascii(c);
            if mapped.is_empty() {
                if VOCAB.contains_key(&c) {
                    ipa.push(c);
                }
            } else {
                for m in mapped.chars() {
                    if VOCAB.contains_key(&m) {
                        ipa.push(m);
                    }
                }
            }
            i += 1;
        }

        if ipa.is_empty() {
            log::warn!("no IPA output for text: {text:?}");
            return Vec::new();
        }

        let mut ids = Vec::with_capacity(ipa.chars().count() + 2);
        ids.push(PAD_TOKEN_ID);
        for c in ipa.chars() {
            if let Some(&id) = VOCAB.get(&c) {
                ids.push(id);
            }
            // Unknown scalars are skipped silently, matching the
            // reference tokenizer.
        }
        ids.push(PAD_TOKEN_ID);

        if ids.len() > MAX_TOKEN_LEN {
            ids.truncate(MAX_TOKEN_LEN);
            *ids.last_mut().unwrap() = PAD_TOKEN_ID;
        }

        ids
    }

    fn english_to_ipa(&self, text: &str) -> String {
        if !self.espeak_available {
            log::warn!("espeak-ng not available, skipping English: {text:?}");
            return String::new();
        }

        match espeak::text_to_ipa(text) {
            Ok(ipa) => to_gruut_en_us(&ipa),
            Err(e) => {
                log::warn!("espeak-ng failed on {text:?}: {e}");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocab_has_114_sparse_entries() {
        assert_eq!(VOCAB_ENTRIES.len(), 114);
        assert!(VOCAB.values().all(|&id| (1..=177).contains(&id)));
        assert!(!VOCAB.values().any(|&id| id == PAD_TOKEN_ID));
    }

    #[test]
    fn parses_pinyin_with_longest_initial() {
        let parts = parse_pinyin("zhong1");
        assert_eq!(parts.initial, "zh");
        assert_eq!(parts.final_part, "ong");
        assert_eq!(parts.tone, 1);

        let parts = parse_pinyin("an4");
        assert_eq!(parts.initial, "");
        assert_eq!(parts.final_part, "an");
        assert_eq!(parts.tone, 4);
    }

    #[test]
    fn pinyin_to_ipa_general_case() {
        assert_eq!(pinyin_to_ipa("zhong1"), "ʈʂʊŋ→");
        assert_eq!(pinyin_to_ipa("hao3"), "xau↓");
        assert_eq!(pinyin_to_ipa("ma5"), "ma");
        assert_eq!(pinyin_to_ipa("wen2"), "wən↗");
    }

    #[test]
    fn syllabic_vowels_after_sibilants() {
        assert_eq!(pinyin_to_ipa("shi4"), "ʂɻ↘");
        assert_eq!(pinyin_to_ipa("zhi1"), "ʈʂɻ→");
        assert_eq!(pinyin_to_ipa("ri4"), "ɻɻ↘");
        assert_eq!(pinyin_to_ipa("si1"), "sɹ→");
        assert_eq!(pinyin_to_ipa("ci2"), "tsʰɹ↗");
    }

    #[test]
    fn u_after_jqx_reads_as_umlaut() {
        assert_eq!(pinyin_to_ipa("ju2"), "tɕy↗");
        assert_eq!(pinyin_to_ipa("xue2"), "ɕɥe↗");
        assert_eq!(pinyin_to_ipa("quan2"), "tɕʰɥɛn↗");
    }

    #[test]
    fn chinese_tokens_are_padded_with_zero() {
        let phonemizer = KokoroPhonemizer::new();
        let ids = phonemizer.text_to_token_ids("你好");
        assert!(ids.len() > 2);
        assert_eq!(*ids.first().unwrap(), PAD_TOKEN_ID);
        assert_eq!(*ids.last().unwrap(), PAD_TOKEN_ID);
        assert!(ids[1..ids.len() - 1].iter().all(|&id| id != PAD_TOKEN_ID));
    }

    #[test]
    fn long_input_truncates_to_limit() {
        let phonemizer = KokoroPhonemizer::new();
        let text = "你好".repeat(400);
        let ids = phonemizer.text_to_token_ids(&text);
        assert_eq!(ids.len(), MAX_TOKEN_LEN);
        assert_eq!(*ids.last().unwrap(), PAD_TOKEN_ID);
    }

    #[test]
    fn empty_and_unspeakable_inputs_yield_no_tokens() {
        let phonemizer = KokoroPhonemizer::new();
        assert!(phonemizer.text_to_token_ids("").is_empty());
        assert!(phonemizer.text_to_token_ids("~~~").is_empty());
    }

    #[test]
    fn cjk_punctuation_maps_into_vocab() {
        let phonemizer = KokoroPhonemizer::new();
        let plain = phonemizer.text_to_token_ids("你好");
        let with_punct = phonemizer.text_to_token_ids("你好！");
        assert_eq!(with_punct.len(), plain.len() + 1);
        assert_eq!(with_punct[with_punct.len() - 2], VOCAB[&'!']);
    }
}
