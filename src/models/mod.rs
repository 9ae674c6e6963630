// cefr-grader Data Models
// Wire shapes for lexicon records, classification results and requests

use serde::{Deserialize, Serialize};
use std::fmt;

// ============ Level Tag ============

/// CEFR proficiency level of a word or sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelTag {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    #[default]
    Unknown,
}

impl LevelTag {
    pub const ALL: [LevelTag; 7] = [
        LevelTag::A1,
        LevelTag::A2,
        LevelTag::B1,
        LevelTag::B2,
        LevelTag::C1,
        LevelTag::C2,
        LevelTag::Unknown,
    ];

    /// Numeric weight used by sentence aggregation (`unknown` counts as 0).
    pub fn weight(self) -> u32 {
        match self {
            LevelTag::A1 => 1,
            LevelTag::A2 => 2,
            LevelTag::B1 => 3,
            LevelTag::B2 => 4,
            LevelTag::C1 => 5,
            LevelTag::C2 => 6,
            LevelTag::Unknown => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LevelTag::A1 => "A1",
            LevelTag::A2 => "A2",
            LevelTag::B1 => "B1",
            LevelTag::B2 => "B2",
            LevelTag::C1 => "C1",
            LevelTag::C2 => "C2",
            LevelTag::Unknown => "unknown",
        }
    }

    /// Lenient parse: trimmed, case-insensitive; anything unrecognised is `Unknown`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => LevelTag::A1,
            "A2" => LevelTag::A2,
            "B1" => LevelTag::B1,
            "B2" => LevelTag::B2,
            "C1" => LevelTag::C1,
            "C2" => LevelTag::C2,
            _ => LevelTag::Unknown,
        }
    }
}

impl fmt::Display for LevelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LevelTag {
    fn from(s: String) -> Self {
        LevelTag::parse_lenient(&s)
    }
}

impl From<LevelTag> for String {
    fn from(level: LevelTag) -> Self {
        level.as_str().to_string()
    }
}

// ============ Lexicon Records ============

/// One `{word, level}` record as supplied by a lexicon source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLevel {
    pub word: String,
    #[serde(default)]
    pub level: LevelTag,
}

impl WordLevel {
    pub fn new(word: impl Into<String>, level: LevelTag) -> Self {
        Self {
            word: word.into(),
            level,
        }
    }
}

/// Entry of the raw word list fed to the lexicon builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
}

// ============ Classification Result ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedWord {
    /// Cleaned, lower-cased token.
    pub word: String,
    pub level: LevelTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Trimmed original substring, original case.
    pub raw: String,
    pub words: Vec<ClassifiedWord>,
    pub level: LevelTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ClassificationResult {
    pub sentences: Vec<Sentence>,
    /// Whole-text tokenization, duplicates retained.
    pub words: Vec<ClassifiedWord>,
}

// ============ Request / Error Payloads ============

/// Request body `{ "text": ... }`. `text` is kept as a raw JSON value so a
/// missing, null or non-string field can be reported as invalid input.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub text: Option<serde_json::Value>,
}

impl ClassifyRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(serde_json::Value::String(text.into())),
        }
    }

    pub fn text_str(&self) -> Option<&str> {
        self.text.as_ref().and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
