//! IPA rewriting toward the Gruut US inventory the Matcha English and
//! Kokoro models were trained on.

/// Rewrite espeak-flavoured IPA into Gruut US conventions: r-colored
/// vowels are decomposed, diphthongs collapse to single uppercase
/// letters, affricates collapse to their single-glyph forms, and `g`/`r`
/// are normalized to their IPA code points.
pub fn to_gruut_en_us(ipa: &str) -> String {
    let mut text = ipa.replace('\u{200d}', "");

    // Longer patterns first so diphthong components are not consumed
    // by the single-character rules below.
    const REPLACEMENTS: &[(&str, &str)] = &[
        // nurse, letter
        ("ɝ", "ɜɹ"),
        ("ɚ", "əɹ"),
        // face, price, choice
        ("eɪ", "A"),
        ("aɪ", "I"),
        ("ɔɪ", "Y"),
        // goat: American, British, and a rarer variant
        ("oʊ", "O"),
        ("əʊ", "O"),
        ("ɛʊ", "O"),
        // mouth
        ("aʊ", "W"),
        // affricates
        ("tʃ", "ʧ"),
        ("dʒ", "ʤ"),
        // ASCII g/r to IPA script g (U+0261) and turned r (U+0279)
        ("g", "ɡ"),
        ("r", "ɹ"),
    ];

    for (from, to) in REPLACEMENTS {
        text = text.replace(from, to);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_r_colored_vowels() {
        assert_eq!(to_gruut_en_us("ɝ"), "ɜɹ");
        assert_eq!(to_gruut_en_us("ɚ"), "əɹ");
    }

    #[test]
    fn collapses_diphthongs_and_affricates() {
        assert_eq!(to_gruut_en_us("heɪ"), "hA");
        assert_eq!(to_gruut_en_us("aɪ"), "I");
        assert_eq!(to_gruut_en_us("tʃiːz"), "ʧiːz");
        assert_eq!(to_gruut_en_us("dʒɔɪ"), "ʤY");
    }

    #[test]
    fn normalizes_g_and_r_glyphs() {
        assert_eq!(to_gruut_en_us("ɡreɪt"), "ɡɹAt");
        assert_eq!(to_gruut_en_us("go"), "ɡo");
    }

    #[test]
    fn strips_zero_width_joiner() {
        assert_eq!(to_gruut_en_us("a\u{200d}b"), "ab");
    }
}
