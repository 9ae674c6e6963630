// Level Aggregation
// Collapses per-word levels into a single sentence level

use crate::models::{ClassifiedWord, LevelTag};

/// Upper bounds (exclusive) of the average weight for each level, ascending.
const LEVEL_BANDS: [(f64, LevelTag); 5] = [
    (1.5, LevelTag::A1),
    (2.5, LevelTag::A2),
    (3.5, LevelTag::B1),
    (4.5, LevelTag::B2),
    (5.5, LevelTag::C1),
];

/// Average weight of the words; `None` for an empty slice.
pub fn average_weight(words: &[ClassifiedWord]) -> Option<f64> {
    if words.is_empty() {
        return None;
    }
    let total: u32 = words.iter().map(|w| w.level.weight()).sum();
    Some(total as f64 / words.len() as f64)
}

/// Map an average weight onto a level using half-open bands: 1.5 is A2, not A1.
pub fn level_from_average(avg: f64) -> LevelTag {
    if avg <= 0.0 {
        return LevelTag::Unknown;
    }
    LEVEL_BANDS
        .iter()
        .find(|(upper, _)| avg < *upper)
        .map(|(_, level)| *level)
        .unwrap_or(LevelTag::C2)
}

/// Aggregate a sentence's words into one level.
pub fn aggregate(words: &[ClassifiedWord]) -> LevelTag {
    average_weight(words)
        .map(level_from_average)
        .unwrap_or(LevelTag::Unknown)
}
