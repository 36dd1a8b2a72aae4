//! English tokenizer for the Matcha ljspeech model: espeak-ng IPA,
//! Gruut US rewriting, then per-character vocabulary lookup wrapped in
//! `^`/`$` sentence markers.

use crate::text::espeak;
use crate::text::phonemes::to_gruut_en_us;
use crate::text::tokens::TokenMap;
use crate::text::utils::contains_cjk;

pub(crate) fn token_ids(tokens: &TokenMap, text: &str) -> Vec<i64> {
    // This model is monolingual; Chinese input is skipped silently.
    if contains_cjk(text) {
        return Vec::new();
    }

    let ipa = match espeak::text_to_ipa(text) {
        Ok(ipa) if !ipa.is_empty() => ipa,
        Ok(_) => return Vec::new(),
        Err(e) => {
            log::warn!("espeak-ng failed: {e}");
            return Vec::new();
        }
    };

    ipa_to_ids(tokens, &to_gruut_en_us(&ipa))
}

pub(crate) fn ipa_to_ids(tokens: &TokenMap, gruut_ipa: &str) -> Vec<i64> {
    let mut ids = Vec::new();

    if let Some(&id) = tokens.get("^") {
        ids.push(id);
    }

    let mut last_was_space = false;
    let mut buf = [0u8; 4];
    for c in gruut_ipa.chars() {
        if matches!(c, '\u{200d}' | '\u{200c}' | '\u{feff}' | '\u{a0}') || c.is_control() {
            continue;
        }

        if c == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }

        let key: &str = c.encode_utf8(&mut buf);
        match tokens.get(key) {
            Some(&id) => ids.push(id),
            None if c != ' ' => log::warn!("unknown phoneme token {c:?}"),
            None => {}
        }
    }

    if let Some(&id) = tokens.get("$") {
        ids.push(id);
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tokens() -> TokenMap {
        let entries = [("^", 1), ("$", 2), (" ", 3), ("h", 4), ("ə", 5), ("l", 6), ("O", 7)];
        entries
            .iter()
            .map(|(token, id)| (token.to_string(), *id as i64))
            .collect()
    }

    #[test]
    fn wraps_with_sentence_markers() {
        let ids = ipa_to_ids(&test_tokens(), "həlO");
        assert_eq!(ids, vec![1, 4, 5, 6, 7, 2]);
    }

    #[test]
    fn collapses_spaces_and_skips_zero_width() {
        let ids = ipa_to_ids(&test_tokens(), "h  ə\u{200d}l");
        assert_eq!(ids, vec![1, 4, 3, 5, 6, 2]);
    }

    #[test]
    fn unknown_glyphs_are_skipped() {
        let ids = ipa_to_ids(&test_tokens(), "hXl");
        assert_eq!(ids, vec![1, 4, 6, 2]);
    }

    #[test]
    fn chinese_input_yields_empty_sequence() {
        assert!(token_ids(&test_tokens(), "你好").is_empty());
        assert!(token_ids(&test_tokens(), "hello 你好").is_empty());
    }

    #[test]
    fn full_pipeline_when_espeak_present() {
        if !espeak::is_available() {
            return;
        }
        let mut tokens = test_tokens();
        for (i, c) in "əlOʊɛjˈoːʃɹɡaʧ".chars().enumerate() {
            tokens.entry(c.to_string()).or_insert(100 + i as i64);
        }
        let ids = token_ids(&tokens, "hello");
        assert!(ids.len() > 2);
        assert_eq!(ids[0], 1);
        assert_eq!(*ids.last().unwrap(), 2);
    }
}
