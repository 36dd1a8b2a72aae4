//! Hanzi → pinyin conversion shared by the bilingual and Kokoro paths.

use pinyin::ToPinyin;

/// Numeric-tone pinyin per character (TONE3 style), writing the neutral
/// tone as 5: 你好吗 -> ["ni3", "hao3", "ma5"]. Non-hanzi characters
/// are dropped.
pub fn hanzi_to_pinyin_tone3(text: &str) -> Vec<String> {
    text.to_pinyin()
        .flatten()
        .map(|p| {
            let syllable = p.with_tone_num_end();
            if syllable.ends_with(|c: char| c.is_ascii_digit()) {
                syllable.to_string()
            } else {
                format!("{syllable}5")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tones_are_numeric_and_neutral_is_five() {
        assert_eq!(hanzi_to_pinyin_tone3("你好"), vec!["ni3", "hao3"]);
        assert_eq!(hanzi_to_pinyin_tone3("吗"), vec!["ma5"]);
        assert_eq!(hanzi_to_pinyin_tone3("中国"), vec!["zhong1", "guo2"]);
    }

    #[test]
    fn non_hanzi_is_dropped() {
        assert_eq!(hanzi_to_pinyin_tone3("a你b"), vec!["ni3"]);
        assert!(hanzi_to_pinyin_tone3("abc").is_empty());
    }
}
