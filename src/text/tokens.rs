//! Readers for the token-map and lexicon files shipped with the models.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, TtsError};

/// Token string to model id.
pub type TokenMap = HashMap<String, i64>;

/// Word to whitespace-separated phoneme sequence.
pub type Lexicon = HashMap<String, String>;

/// Read a `tokens.txt`-style vocabulary.
///
/// Two layouts are accepted per line: `<token> <id>` pairs, or a bare
/// token whose id is the 0-based line index.
pub fn read_token_map(path: &Path) -> Result<TokenMap> {
    let content = fs::read_to_string(path)
        .map_err(|e| TtsError::ModelNotFound(format!("{}: {e}", path.display())))?;

    let mut map = TokenMap::new();
    for (line_idx, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some(token), Some(id)) => {
                if let Ok(id) = id.parse::<i64>() {
                    map.insert(token.to_string(), id);
                } else {
                    map.insert(line.to_string(), line_idx as i64);
                }
            }
            _ => {
                map.insert(line.to_string(), line_idx as i64);
            }
        }
    }

    Ok(map)
}

/// Read the bilingual `vocab_tts.txt`: one token per line, 1-based line
/// number as id. A line holding a single space is the space token.
pub fn read_bilingual_token_map(path: &Path) -> Result<TokenMap> {
    let content = fs::read_to_string(path)
        .map_err(|e| TtsError::ModelNotFound(format!("{}: {e}", path.display())))?;

    let mut map = TokenMap::new();
    for (line_idx, line) in content.lines().enumerate() {
        let id = line_idx as i64 + 1;
        if line == " " {
            map.insert(" ".to_string(), id);
            continue;
        }
        let token = line.trim();
        if !token.is_empty() {
            map.insert(token.to_string(), id);
        }
    }

    Ok(map)
}

/// Read a `lexicon.txt`: `<word> <phoneme> <phoneme> ...` per line.
pub fn read_lexicon(path: &Path) -> Result<Lexicon> {
    let content = fs::read_to_string(path)
        .map_err(|e| TtsError::ModelNotFound(format!("{}: {e}", path.display())))?;

    let mut lexicon = Lexicon::new();
    for line in content.lines() {
        if let Some((word, phones)) = line.split_once(' ') {
            let phones = phones.trim();
            if !word.is_empty() && !phones.is_empty() {
                lexicon.insert(word.to_string(), phones.to_string());
            }
        }
    }

    Ok(lexicon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn pair_format_uses_explicit_ids() {
        let path = write_temp("polytts_tokens_pairs.txt", "sil 0\na1 5\nzh 12\n");
        let map = read_token_map(&path).unwrap();
        assert_eq!(map["sil"], 0);
        assert_eq!(map["a1"], 5);
        assert_eq!(map["zh"], 12);
    }

    #[test]
    fn bare_format_uses_line_index() {
        let path = write_temp("polytts_tokens_lines.txt", "^\n$\na\n");
        let map = read_token_map(&path).unwrap();
        assert_eq!(map["^"], 0);
        assert_eq!(map["$"], 1);
        assert_eq!(map["a"], 2);
    }

    #[test]
    fn bilingual_map_is_one_based_and_keeps_space() {
        let path = write_temp("polytts_vocab_tts.txt", "<unk>\n \nzhong1\n");
        let map = read_bilingual_token_map(&path).unwrap();
        assert_eq!(map["<unk>"], 1);
        assert_eq!(map[" "], 2);
        assert_eq!(map["zhong1"], 3);
    }

    #[test]
    fn lexicon_splits_word_from_phones() {
        let path = write_temp("polytts_lexicon.txt", "你好 n i2 h ao3\n世界 sh ix4 j ie4\n");
        let lex = read_lexicon(&path).unwrap();
        assert_eq!(lex["你好"], "n i2 h ao3");
        assert_eq!(lex["世界"], "sh ix4 j ie4");
    }

    #[test]
    fn missing_file_is_model_not_found() {
        let err = read_token_map(Path::new("/nonexistent/tokens.txt")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ModelNotFound);
    }
}
