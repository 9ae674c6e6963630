// Tokenizer / Cleaner
// Whitespace tokenization and letter-only cleaning; lossy on purpose
// ("don't." -> "dont", "well-known" -> "wellknown").

use crate::models::{ClassifiedWord, LevelTag};
use crate::services::lexicon::LevelMap;

/// Strip every character that is not an ASCII letter. `None` if nothing is left.
pub fn clean(token: &str) -> Option<String> {
    let cleaned: String = token.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Split on runs of whitespace after trimming.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.trim().split_whitespace()
}

/// Clean, lower-case and look a token up. Tokens with no letters yield `None`.
pub fn classify_word(token: &str, level_map: &LevelMap) -> Option<ClassifiedWord> {
    let word = clean(token)?.to_ascii_lowercase();
    let level = level_map.get(&word).unwrap_or(LevelTag::Unknown);
    Some(ClassifiedWord { word, level })
}

/// Tokenize a span and classify every token that survives cleaning, in order.
pub fn classify_words(text: &str, level_map: &LevelMap) -> Vec<ClassifiedWord> {
    tokenize(text)
        .filter_map(|token| classify_word(token, level_map))
        .collect()
}
