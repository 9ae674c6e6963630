// Lexicon Builder
// Classifies new words in batches through a chat model and persists the
// growing `{word, level}` list after every batch.

use crate::error::LexiconError;
use crate::models::{LevelTag, WordEntry, WordLevel};
use crate::services::providers::ChatCompletion;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 200;

const CLASSIFY_SYSTEM_PROMPT: &str = "You are a language classification AI. Your task is to classify English words into CEFR levels: A1, A2, B1, B2, C1, C2. If a word is not found in the dictionary, assign \"unknown\". Return a JSON object where keys are words and values are levels.";

static FENCED_JSON_RE: OnceLock<Regex> = OnceLock::new();

fn fenced_json_re() -> &'static Regex {
    FENCED_JSON_RE
        .get_or_init(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("valid fence pattern"))
}

/// How a model response was turned into word levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The response decoded as a JSON object of word -> level.
    Structured(HashMap<String, LevelTag>),
    /// Not JSON; lines were matched to the batch words by position.
    Fallback(HashMap<String, LevelTag>),
    Failed(String),
}

impl ParseOutcome {
    pub fn levels(&self) -> Option<&HashMap<String, LevelTag>> {
        match self {
            ParseOutcome::Structured(levels) | ParseOutcome::Fallback(levels) => Some(levels),
            ParseOutcome::Failed(_) => None,
        }
    }
}

/// Body of a fenced ```json block if present, else the whole trimmed text.
fn strip_json_fence(content: &str) -> &str {
    let trimmed = content.trim();
    fenced_json_re()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

/// Structured decode first, positional line matching second.
pub fn parse_classification_response(content: &str, words: &[String]) -> ParseOutcome {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return ParseOutcome::Failed("empty response".to_string());
    }

    let body = strip_json_fence(trimmed);
    if let Ok(decoded) = serde_json::from_str::<HashMap<String, serde_json::Value>>(body) {
        let levels = decoded
            .into_iter()
            .map(|(word, value)| {
                let level = value
                    .as_str()
                    .map(LevelTag::parse_lenient)
                    .unwrap_or(LevelTag::Unknown);
                (word, level)
            })
            .collect();
        return ParseOutcome::Structured(levels);
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();
    let levels = words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let level = lines
                .get(i)
                .map(|line| LevelTag::parse_lenient(line))
                .unwrap_or(LevelTag::Unknown);
            (word.clone(), level)
        })
        .collect();
    ParseOutcome::Fallback(levels)
}

pub fn build_user_prompt(words: &[String]) -> String {
    format!("Classify these words: {}", words.join(", "))
}

/// Classify one batch. Provider or parse failures mark the batch `unknown`.
pub async fn classify_batch<C: ChatCompletion>(chat: &C, words: &[String]) -> Vec<WordLevel> {
    info!(batch_size = words.len(), "lexicon.batch.sending");

    let outcome = match chat
        .complete(CLASSIFY_SYSTEM_PROMPT, &build_user_prompt(words))
        .await
    {
        Ok(content) => parse_classification_response(&content, words),
        Err(e) => {
            error!(error = %e, "lexicon.batch.provider_failed");
            ParseOutcome::Failed(e.to_string())
        }
    };

    match &outcome {
        ParseOutcome::Structured(levels) => {
            info!(entries = levels.len(), "lexicon.batch.parsed_structured")
        }
        ParseOutcome::Fallback(_) => warn!("lexicon.batch.parsed_line_fallback"),
        ParseOutcome::Failed(reason) => warn!(reason = %reason, "lexicon.batch.parse_failed"),
    }

    let levels = outcome.levels();
    words
        .iter()
        .map(|word| {
            let level = levels
                .and_then(|l| l.get(word))
                .copied()
                .unwrap_or(LevelTag::Unknown);
            WordLevel::new(word.clone(), level)
        })
        .collect()
}

/// Words from the raw word list. Unreadable input is logged and treated as empty.
pub fn read_word_list(path: &Path) -> Vec<String> {
    let parsed = fs::read_to_string(path)
        .map_err(LexiconError::from)
        .and_then(|content| serde_json::from_str::<Vec<WordEntry>>(&content).map_err(LexiconError::from));
    match parsed {
        Ok(entries) => {
            info!(path = %path.display(), words = entries.len(), "lexicon.word_list.loaded");
            entries.into_iter().map(|e| e.word).collect()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "lexicon.word_list.unreadable");
            Vec::new()
        }
    }
}

/// Existing classified records; missing or unreadable means none yet.
pub fn read_classified(path: &Path) -> Vec<WordLevel> {
    let parsed = fs::read_to_string(path)
        .map_err(LexiconError::from)
        .and_then(|content| serde_json::from_str::<Vec<WordLevel>>(&content).map_err(LexiconError::from));
    match parsed {
        Ok(records) => records,
        Err(e) => {
            info!(path = %path.display(), error = %e, "lexicon.classified.none");
            Vec::new()
        }
    }
}

pub fn write_classified(path: &Path, records: &[WordLevel]) -> Result<(), LexiconError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(records)?;
    fs::write(path, content)?;
    Ok(())
}

/// Words not yet classified, in word-list order, without repeats.
pub fn pending_words(all_words: &[String], classified: &[WordLevel]) -> Vec<String> {
    let mut seen: HashSet<&str> = classified.iter().map(|r| r.word.as_str()).collect();
    all_words
        .iter()
        .filter(|w| seen.insert(w.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub total_words: usize,
    pub newly_classified: usize,
    pub batches: usize,
    pub failed_writes: usize,
}

pub struct LexiconBuilder {
    words_file: PathBuf,
    classified_file: PathBuf,
    batch_size: usize,
}

impl LexiconBuilder {
    pub fn new(words_file: impl Into<PathBuf>, classified_file: impl Into<PathBuf>) -> Self {
        Self {
            words_file: words_file.into(),
            classified_file: classified_file.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn classified_file(&self) -> &Path {
        &self.classified_file
    }

    /// Classify every word in the word list that the classified file lacks.
    pub async fn refresh<C: ChatCompletion>(&self, chat: &C) -> Result<RefreshSummary, LexiconError> {
        let all_words = read_word_list(&self.words_file);
        if all_words.is_empty() {
            error!(path = %self.words_file.display(), "lexicon.word_list.empty");
            return Err(LexiconError::Empty);
        }

        let mut classified = read_classified(&self.classified_file);
        let new_words = pending_words(&all_words, &classified);

        let mut summary = RefreshSummary {
            total_words: all_words.len(),
            ..Default::default()
        };

        if new_words.is_empty() {
            info!("lexicon.up_to_date");
            return Ok(summary);
        }

        info!(new_words = new_words.len(), batch_size = self.batch_size, "lexicon.refresh.start");

        for (index, batch) in new_words.chunks(self.batch_size).enumerate() {
            info!(batch = index + 1, "lexicon.batch.processing");
            let records = classify_batch(chat, batch).await;
            summary.newly_classified += records.len();
            summary.batches += 1;
            classified.extend(records);

            match write_classified(&self.classified_file, &classified) {
                Ok(()) => info!(path = %self.classified_file.display(), "lexicon.batch.saved"),
                Err(e) => {
                    summary.failed_writes += 1;
                    error!(error = %e, "lexicon.batch.save_failed");
                }
            }
        }

        info!(
            classified = summary.newly_classified,
            batches = summary.batches,
            "lexicon.refresh.done"
        );
        Ok(summary)
    }
}
