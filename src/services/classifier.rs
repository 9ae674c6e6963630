// Classification Pipeline
// raw text -> sentences -> words -> levels, plus the whole-text word list

use crate::error::ClassifyError;
use crate::models::{ClassificationResult, ClassifyRequest, Sentence};
use crate::services::aggregation::aggregate;
use crate::services::lexicon::LevelMap;
use crate::services::sentence_segmenter::{segment_with_mode, SegmentationMode};
use crate::services::tokenizer::classify_words;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyOptions {
    #[serde(default)]
    pub segmentation: SegmentationMode,
    /// Reject text containing anything but ASCII letters, whitespace and `. ! ?`.
    #[serde(default)]
    pub strict_charset: bool,
}

fn is_permitted_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '.' | '!' | '?')
}

/// Check that `text` is classifiable under `options`.
pub fn validate_text(text: &str, options: &ClassifyOptions) -> Result<(), ClassifyError> {
    if text.is_empty() {
        return Err(ClassifyError::InvalidInput(
            "text must be a non-empty string".to_string(),
        ));
    }
    if options.strict_charset {
        if let Some(c) = text.chars().find(|c| !is_permitted_char(*c)) {
            return Err(ClassifyError::InvalidInput(format!(
                "text contains unsupported character {:?}",
                c
            )));
        }
    }
    Ok(())
}

/// Classify text with the default options.
pub fn classify(text: &str, level_map: &LevelMap) -> Result<ClassificationResult, ClassifyError> {
    classify_with_options(text, level_map, &ClassifyOptions::default())
}

pub fn classify_with_options(
    text: &str,
    level_map: &LevelMap,
    options: &ClassifyOptions,
) -> Result<ClassificationResult, ClassifyError> {
    validate_text(text, options)?;

    let words = classify_words(text, level_map);

    let sentences: Vec<Sentence> = segment_with_mode(text, options.segmentation)
        .into_iter()
        .map(|raw| {
            let words = classify_words(&raw, level_map);
            let level = aggregate(&words);
            Sentence { raw, words, level }
        })
        .collect();

    debug!(
        sentences = sentences.len(),
        words = words.len(),
        mode = ?options.segmentation,
        "classify.done"
    );

    Ok(ClassificationResult { sentences, words })
}

/// Classify a `{ "text": ... }` request body. Missing, null and non-string
/// `text` are invalid input.
pub fn classify_request(
    request: &ClassifyRequest,
    level_map: &LevelMap,
    options: &ClassifyOptions,
) -> Result<ClassificationResult, ClassifyError> {
    let text = request.text_str().ok_or_else(|| {
        ClassifyError::InvalidInput("text is required and must be a string".to_string())
    })?;
    classify_with_options(text, level_map, options)
}
