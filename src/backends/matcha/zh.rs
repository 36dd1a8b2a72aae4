//! Chinese tokenizer for the Matcha zh-baker model: jieba word
//! segmentation, lexicon lookup, and layered fallbacks down to single
//! characters.

use std::path::Path;

use jieba_rs::Jieba;

use crate::error::Result;
use crate::text::tokens::{self, Lexicon, TokenMap};
use crate::text::utils::{is_punctuation_str, map_punctuation_token};

/// Static fixups for lexicon phonemes the vocabulary does not carry.
const PHONEME_FALLBACKS: &[(&str, &str)] = &[
    ("shei2", "she2"),
    ("cei2", "ce2"),
    ("den1", "de1"),
    ("den2", "de2"),
    ("den3", "de3"),
    ("den4", "de4"),
    ("kei2", "ke2"),
    ("kei3", "ke3"),
    ("nei1", "ne1"),
    ("pou1", "po1"),
    ("pou2", "po2"),
    ("pou3", "po3"),
    ("yo1", "yo"),
    ("m2", "m"),
    ("n2", "n"),
    ("ng2", "ng"),
    ("hm", "hm1"),
];

pub(crate) struct ZhTokenizer {
    jieba: Jieba,
    lexicon: Lexicon,
}

impl ZhTokenizer {
    pub fn new(lexicon_path: Option<&Path>) -> Result<Self> {
        let lexicon = match lexicon_path {
            Some(path) if path.exists() => {
                let lexicon = tokens::read_lexicon(path)?;
                log::info!("loaded {} lexicon entries", lexicon.len());
                lexicon
            }
            _ => {
                log::warn!("lexicon file not found, continuing without lexicon");
                Lexicon::new()
            }
        };

        Ok(Self {
            jieba: Jieba::new(),
            lexicon,
        })
    }

    #[cfg(test)]
    pub fn with_lexicon(lexicon: Lexicon) -> Self {
        Self {
            jieba: Jieba::new(),
            lexicon,
        }
    }

    pub fn token_ids(&self, tokens: &TokenMap, text: &str) -> Vec<i64> {
        // Half-width and ASCII sentence punctuation folds into the
        // full-width forms the model was trained on.
        let prepared: String = text
            .chars()
            .map(|c| match c {
                '：' | '、' | '；' => '，',
                '.' => '。',
                '?' => '？',
                '!' => '！',
                other => other,
            })
            .collect();

        let words = self.jieba.cut(&prepared, true);

        // Collapse runs of whitespace and punctuation.
        let mut cleaned: Vec<&str> = Vec::with_capacity(words.len());
        for word in words {
            match cleaned.last() {
                None => cleaned.push(word),
                Some(&prev) => {
                    let redundant = (word.trim().is_empty() || is_punctuation_str(word))
                        && (prev.trim().is_empty() || is_punctuation_str(prev));
                    if !redundant {
                        cleaned.push(word);
                    }
                }
            }
        }

        let mut ids = Vec::new();
        for word in cleaned {
            ids.extend(self.word_to_ids(tokens, word));
        }
        ids
    }

    fn word_to_ids(&self, tokens: &TokenMap, word: &str) -> Vec<i64> {
        let lower = word.to_lowercase();

        if let Some(phones) = self.lexicon.get(&lower) {
            return self.phonemes_to_ids(tokens, phones);
        }

        if let Some(&id) = tokens.get(word) {
            return vec![id];
        }

        if is_punctuation_str(word) {
            if let Some(mapped) = map_punctuation_token(word, |t| tokens.contains_key(t)) {
                if let Some(&id) = tokens.get(mapped.as_str()) {
                    return vec![id];
                }
            }
            return Vec::new();
        }

        // Character-level fallback for words the segmenter produced but
        // neither the lexicon nor the vocabulary knows.
        let mut ids = Vec::new();
        for c in word.chars() {
            let s = c.to_string();
            if let Some(phones) = self.lexicon.get(&s) {
                ids.extend(self.phonemes_to_ids(tokens, phones));
            } else if let Some(&id) = tokens.get(s.as_str()) {
                ids.push(id);
            }
        }
        ids
    }

    fn phonemes_to_ids(&self, tokens: &TokenMap, phones: &str) -> Vec<i64> {
        let mut ids = Vec::new();
        for phone in phones.split_whitespace() {
            if let Some(&id) = tokens.get(phone) {
                ids.push(id);
                continue;
            }
            let mapped = map_phoneme(phone);
            if mapped != phone {
                if let Some(&id) = tokens.get(mapped.as_str()) {
                    ids.push(id);
                } else {
                    log::warn!("unknown phoneme {phone:?} (mapped {mapped:?})");
                }
            }
        }
        ids
    }
}

/// Resolve a phoneme the vocabulary lacks: the static table first, then
/// a tone heuristic (strip the tone digit, or append tone 1).
fn map_phoneme(phone: &str) -> String {
    if let Some((_, to)) = PHONEME_FALLBACKS.iter().find(|(from, _)| *from == phone) {
        return (*to).to_string();
    }

    if phone.len() > 1 {
        let last = phone.as_bytes()[phone.len() - 1];
        if (b'1'..=b'4').contains(&last) {
            return phone[..phone.len() - 1].to_string();
        }
        return format!("{phone}1");
    }

    phone.to_string()
}
