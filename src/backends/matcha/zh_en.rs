//! Bilingual tokenizer for the Matcha zh-en model: the input is walked
//! by script class — Chinese runs go through pinyin, English runs
//! through IPA, digits through the Chinese reading, and Roman numerals
//! inside English runs through the numeric path. No blank tokens.

use crate::text::espeak;
use crate::text::numbers::{digits_spelled, int_to_chinese, is_roman_numeral, roman_to_int};
use crate::text::phonemes::to_gruut_en_us;
use crate::text::pinyin::hanzi_to_pinyin_tone3;
use crate::text::tokens::TokenMap;
use crate::text::utils::is_cjk_char;

/// Fallback id for anything the vocabulary cannot express.
const UNKNOWN_TOKEN_ID: i64 = 1;

pub(crate) fn token_ids(tokens: &TokenMap, text: &str) -> Vec<i64> {
    let chars: Vec<char> = text.chars().collect();
    let mut ids = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if is_cjk_char(c) {
            let mut segment = String::new();
            while i < chars.len() && is_cjk_char(chars[i]) {
                segment.push(chars[i]);
                i += 1;
            }
            ids.extend(chinese_to_ids(tokens, &segment));
            continue;
        }

        if c.is_ascii_alphabetic() {
            let mut segment = String::new();
            while i < chars.len() && (chars[i].is_ascii_alphabetic() || chars[i] == ' ') {
                segment.push(chars[i]);
                i += 1;
            }

            // Roman numerals inside an English run take the numeric
            // reading; everything around them phonemizes as English.
            let mut buffer = String::new();
            for word in segment.split_whitespace() {
                if is_roman_numeral(word) {
                    if !buffer.is_empty() {
                        ids.extend(english_to_ids(tokens, buffer.trim()));
                        buffer.clear();
                    }
                    let chinese = int_to_chinese(roman_to_int(word));
                    ids.extend(chinese_to_ids(tokens, &chinese));
                } else {
                    if !buffer.is_empty() {
                        buffer.push(' ');
                    }
                    buffer.push_str(word);
                }
            }
            if !buffer.is_empty() {
                ids.extend(english_to_ids(tokens, buffer.trim()));
            }
            continue;
        }

        if c.is_ascii_digit() {
            let mut segment = String::new();
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                segment.push(chars[i]);
                i += 1;
            }
            ids.extend(chinese_to_ids(tokens, &arabic_to_chinese(&segment)));
            continue;
        }

        // Punctuation and everything else.
        let mapped = match c {
            '，' => ",".to_string(),
            '。' => ".".to_string(),
            '！' => "!".to_string(),
            '？' => "?".to_string(),
            other => other.to_string(),
        };
        match tokens.get(mapped.as_str()) {
            Some(&id) => ids.push(id),
            None => ids.push(UNKNOWN_TOKEN_ID),
        }
        i += 1;
    }

    ids
}

/// Chinese text → pinyin syllables → vocabulary ids, with a lowercase
/// retry before giving up on a syllable.
fn chinese_to_ids(tokens: &TokenMap, text: &str) -> Vec<i64> {
    hanzi_to_pinyin_tone3(text)
        .into_iter()
        .map(|syllable| {
            if let Some(&id) = tokens.get(syllable.as_str()) {
                return id;
            }
            let lower = syllable.to_lowercase();
            tokens.get(lower.as_str()).copied().unwrap_or(UNKNOWN_TOKEN_ID)
        })
        .collect()
}

fn english_to_ids(tokens: &TokenMap, text: &str) -> Vec<i64> {
    let ipa = match espeak::text_to_ipa(text) {
        Ok(ipa) if !ipa.is_empty() => ipa,
        Ok(_) => return Vec::new(),
        Err(e) => {
            log::warn!("espeak-ng failed on {text:?}: {e}");
            return Vec::new();
        }
    };

    let gruut = to_gruut_en_us(&ipa);
    let mut ids = Vec::new();
    let mut buf = [0u8; 4];
    for c in gruut.chars() {
        let key: &str = c.encode_utf8(&mut buf);
        if let Some(&id) = tokens.get(key) {
            ids.push(id);
        }
        // Unknown IPA glyphs are skipped silently.
    }
    ids
}

/// Arabic digits → Chinese reading, digit-by-digit after the decimal
/// point; over-long integers degrade to digit spelling.
fn arabic_to_chinese(num: &str) -> String {
    match num.split_once('.') {
        Some((int_part, frac_part)) => {
            let mut out = if int_part.is_empty() {
                "零".to_string()
            } else {
                int_part
                    .parse::<i64>()
                    .map(int_to_chinese)
                    .unwrap_or_else(|_| digits_spelled(int_part, false))
            };
            out.push_str("点");
            out.push_str(&digits_spelled(frac_part, false));
            out
        }
        None => num
            .parse::<i64>()
            .map(int_to_chinese)
            .unwrap_or_else(|_| digits_spelled(num, false)),
    }
}
