//! Script classification and punctuation mapping.

/// CJK Unified Ideographs, U+4E00..=U+9FFF.
pub fn is_cjk_char(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk_char)
}

pub fn is_english_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

pub fn is_ascii_digit(c: char) -> bool {
    c.is_ascii_digit()
}

const PUNCTUATION: &[char] = &[
    ',', '.', '!', '?', ':', ';', '"', '\'', '，', '。', '！', '？', '：', '；', '、', '“', '”',
    '‘', '’', '—', '–', '…', '-', '(', ')', '（', '）', '[', ']', '【', '】', '{', '}', '《',
    '》',
];

/// ASCII punctuation plus the full-width CJK set and quotation marks.
pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

pub fn is_punctuation_str(s: &str) -> bool {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => is_punctuation(c),
        _ => false,
    }
}

/// Map a full-width CJK punctuation mark to its ASCII counterpart.
/// Characters without a mapping come back unchanged.
pub fn map_cjk_punct_to_ascii(c: char) -> &'static str {
    match c {
        '！' => "!",
        '？' => "?",
        '，' => ",",
        '。' => ".",
        '：' => ":",
        '；' => ";",
        '、' => ",",
        '‘' | '’' => "'",
        '“' | '”' => "\"",
        '（' => "(",
        '）' => ")",
        '—' | '–' => "-",
        '…' => "...",
        _ => "",
    }
}

/// Resolve a punctuation word against a token vocabulary: direct hit
/// first, then the ASCII mapping, then the generic pause tokens for
/// sentence-final marks.
pub fn map_punctuation_token(
    punct: &str,
    lookup: impl Fn(&str) -> bool,
) -> Option<String> {
    if lookup(punct) {
        return Some(punct.to_string());
    }

    if let Some(c) = punct.chars().next() {
        let ascii = map_cjk_punct_to_ascii(c);
        if !ascii.is_empty() && ascii != punct && lookup(ascii) {
            return Some(ascii.to_string());
        }
    }

    if matches!(punct, "。" | "！" | "？" | "." | "!" | "?") {
        for pause in ["sil", "sp", "<eps>"] {
            if lookup(pause) {
                return Some(pause.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_scripts() {
        assert!(is_cjk_char('你'));
        assert!(is_cjk_char('一'));
        assert!(!is_cjk_char('a'));
        assert!(!is_cjk_char('。'));
        assert!(contains_cjk("abc好def"));
        assert!(!contains_cjk("abc def"));
        assert!(is_english_letter('Q'));
        assert!(!is_english_letter('好'));
        assert!(is_ascii_digit('7'));
        assert!(!is_ascii_digit('七'));
    }

    #[test]
    fn punctuation_set_covers_both_widths() {
        assert!(is_punctuation('，'));
        assert!(is_punctuation(','));
        assert!(is_punctuation('《'));
        assert!(!is_punctuation('好'));
        assert!(is_punctuation_str("。"));
        assert!(!is_punctuation_str("。。"));
    }

    #[test]
    fn cjk_punct_maps_to_ascii() {
        assert_eq!(map_cjk_punct_to_ascii('。'), ".");
        assert_eq!(map_cjk_punct_to_ascii('、'), ",");
        assert_eq!(map_cjk_punct_to_ascii('…'), "...");
        assert_eq!(map_cjk_punct_to_ascii('好'), "");
    }

    #[test]
    fn punctuation_token_falls_back_to_pause() {
        let vocab = ["sil", ","];
        let lookup = |s: &str| vocab.contains(&s);
        assert_eq!(map_punctuation_token(",", lookup).as_deref(), Some(","));
        assert_eq!(map_punctuation_token("、", lookup).as_deref(), Some(","));
        assert_eq!(map_punctuation_token("。", lookup).as_deref(), Some("sil"));
        assert_eq!(map_punctuation_token("(", lookup), None);
    }
}
