// Sentence Segmenter
// Punctuation-driven sentence splitting with order-preserving dedup.
// No abbreviation or locale handling: the rules below are the whole contract.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Characters that may end a sentence.
pub const TERMINAL_PUNCTUATION: [char; 4] = ['.', '!', '?', ';'];

static PATTERN_RE: OnceLock<Regex> = OnceLock::new();
static PATTERN_SEMICOLON_RE: OnceLock<Regex> = OnceLock::new();

fn pattern_re() -> &'static Regex {
    PATTERN_RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("valid sentence pattern"))
}

fn pattern_semicolon_re() -> &'static Regex {
    PATTERN_SEMICOLON_RE
        .get_or_init(|| Regex::new(r"[^.!?;]+[.!?;]+").expect("valid sentence pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentationMode {
    /// Terminal scan with punctuation-run absorption and lookahead merging.
    #[default]
    Lookahead,
    /// `[^.!?]+[.!?]+` matches.
    Pattern,
    /// `[^.!?;]+[.!?;]+` matches.
    PatternWithSemicolon,
}

impl SegmentationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lookahead" => Some(SegmentationMode::Lookahead),
            "pattern" => Some(SegmentationMode::Pattern),
            "pattern-semicolon" | "pattern-with-semicolon" => {
                Some(SegmentationMode::PatternWithSemicolon)
            }
            _ => None,
        }
    }
}

fn is_terminal(c: char) -> bool {
    TERMINAL_PUNCTUATION.contains(&c)
}

/// Dedup key: trailing terminal punctuation stripped, lower-cased.
pub fn dedup_key(sentence: &str) -> String {
    sentence.trim_end_matches(is_terminal).to_lowercase()
}

/// Collects trimmed sentences, keeping only the first occurrence of each key.
struct UniqueSentences {
    seen: HashSet<String>,
    sentences: Vec<String>,
}

impl UniqueSentences {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            sentences: Vec::new(),
        }
    }

    fn push(&mut self, span: &str) {
        let sentence = span.trim();
        if sentence.is_empty() {
            return;
        }
        let key = dedup_key(sentence);
        if self.seen.insert(key) {
            self.sentences.push(sentence.to_string());
        } else {
            debug!(sentence = %sentence, "segmenter.duplicate_dropped");
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.sentences
    }
}

/// Byte length of the sentence at the start of `text`.
///
/// Finds the first terminal, absorbs the run of terminals that follows it,
/// and keeps extending to the next terminal while the run is directly
/// followed by something other than whitespace (`3.5`, `."`, `.)`).
/// Without any terminal the whole text is one sentence.
fn sentence_end(text: &str) -> usize {
    let mut pos = 0;
    loop {
        let Some(offset) = text[pos..].find(is_terminal) else {
            return text.len();
        };
        // Terminals are single-byte ASCII, so byte arithmetic stays on char boundaries.
        let mut end = pos + offset + 1;
        while text[end..].starts_with(is_terminal) {
            end += 1;
        }
        match text[end..].chars().next() {
            None => return end,
            Some(c) if c.is_whitespace() => return end,
            Some(_) => pos = end,
        }
    }
}

/// Split text into deduplicated sentences in order of first appearance.
pub fn segment(text: &str) -> Vec<String> {
    let mut out = UniqueSentences::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let end = sentence_end(rest);
        let (span, tail) = rest.split_at(end);
        out.push(span);
        rest = tail.trim_start();
    }
    out.into_vec()
}

/// Regex segmentation. Unpunctuated trailing text is not a match and is
/// dropped; input with no match at all becomes a single sentence.
pub fn segment_by_pattern(text: &str, include_semicolon: bool) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let re = if include_semicolon {
        pattern_semicolon_re()
    } else {
        pattern_re()
    };

    let mut out = UniqueSentences::new();
    let mut matched = false;
    for m in re.find_iter(trimmed) {
        matched = true;
        out.push(m.as_str());
    }
    if !matched {
        out.push(trimmed);
    }
    out.into_vec()
}

pub fn segment_with_mode(text: &str, mode: SegmentationMode) -> Vec<String> {
    match mode {
        SegmentationMode::Lookahead => segment(text),
        SegmentationMode::Pattern => segment_by_pattern(text, false),
        SegmentationMode::PatternWithSemicolon => segment_by_pattern(text, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_basic() {
        let s = segment("The cat sat. The dog ran! Did it rain?");
        assert_eq!(s, vec!["The cat sat.", "The dog ran!", "Did it rain?"]);
    }

    #[test]
    fn test_segment_empty_and_blank() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t ").is_empty());
    }

    #[test]
    fn test_segment_no_punctuation() {
        assert_eq!(segment("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn test_segment_trailing_fragment_kept() {
        let s = segment("First one. second part without end");
        assert_eq!(s, vec!["First one.", "second part without end"]);
    }

    #[test]
    fn test_segment_semicolon_is_terminal() {
        let s = segment("I came; I saw; I left.");
        assert_eq!(s, vec!["I came;", "I saw;", "I left."]);
    }

    #[test]
    fn test_segment_absorbs_punctuation_runs() {
        let s = segment("Really?! Yes... Fine.");
        assert_eq!(s, vec!["Really?!", "Yes...", "Fine."]);
    }

    #[test]
    fn test_segment_lookahead_merges_decimal() {
        let s = segment("It costs 3.5 dollars. Cheap.");
        assert_eq!(s, vec!["It costs 3.5 dollars.", "Cheap."]);
    }

    #[test]
    fn test_segment_lookahead_merges_closing_quote() {
        let s = segment("He said \"stop.\" Then he left.");
        assert_eq!(s, vec!["He said \"stop.\" Then he left."]);
    }

    #[test]
    fn test_segment_lookahead_runs_to_end_without_later_terminal() {
        let s = segment("Version 2.0 is out");
        assert_eq!(s, vec!["Version 2.0 is out"]);
    }

    #[test]
    fn test_segment_dedup_case_and_punctuation() {
        let s = segment("Hello there. hello there! How are you? HELLO THERE");
        assert_eq!(s, vec!["Hello there.", "How are you?"]);
    }

    #[test]
    fn test_segment_only_punctuation() {
        assert_eq!(segment("..."), vec!["..."]);
        assert_eq!(segment("... ?!"), vec!["..."]);
    }

    #[test]
    fn test_segment_multibyte_text() {
        let s = segment("Café au lait. Naïve résumé!");
        assert_eq!(s, vec!["Café au lait.", "Naïve résumé!"]);
    }

    #[test]
    fn test_dedup_key() {
        assert_eq!(dedup_key("Hello There?!"), "hello there");
        assert_eq!(dedup_key("Hi;"), "hi");
        assert_eq!(dedup_key("Hi . "), "hi . ");
    }

    #[test]
    fn test_pattern_basic_and_dedup() {
        let s = segment_by_pattern("A cat. A cat! A dog?", false);
        assert_eq!(s, vec!["A cat.", "A dog?"]);
    }

    #[test]
    fn test_pattern_without_match_is_single_sentence() {
        assert_eq!(segment_by_pattern("hello world", false), vec!["hello world"]);
        assert!(segment_by_pattern("  ", false).is_empty());
    }

    // Divergences between the regex variant and the lookahead scan.
    #[test]
    fn test_pattern_drops_trailing_fragment() {
        let text = "First one. second part";
        assert_eq!(segment_by_pattern(text, false), vec!["First one."]);
        assert_eq!(segment(text), vec!["First one.", "second part"]);
    }

    #[test]
    fn test_pattern_splits_decimal() {
        let text = "It costs 3.5 dollars.";
        assert_eq!(segment_by_pattern(text, false), vec!["It costs 3.", "5 dollars."]);
        assert_eq!(segment(text), vec!["It costs 3.5 dollars."]);
    }

    #[test]
    fn test_pattern_semicolon_variant() {
        let text = "I came; I saw.";
        assert_eq!(segment_by_pattern(text, false), vec!["I came; I saw."]);
        assert_eq!(segment_by_pattern(text, true), vec!["I came;", "I saw."]);
    }

    #[test]
    fn test_plain_prose_agrees_across_modes() {
        let text = "The sun rose. Birds sang! Was it spring?";
        let expected = segment(text);
        assert_eq!(segment_with_mode(text, SegmentationMode::Pattern), expected);
        assert_eq!(
            segment_with_mode(text, SegmentationMode::PatternWithSemicolon),
            expected
        );
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(SegmentationMode::parse("Lookahead"), Some(SegmentationMode::Lookahead));
        assert_eq!(SegmentationMode::parse("pattern"), Some(SegmentationMode::Pattern));
        assert_eq!(
            SegmentationMode::parse("pattern-semicolon"),
            Some(SegmentationMode::PatternWithSemicolon)
        );
        assert_eq!(SegmentationMode::parse("spacy"), None);
    }
}
