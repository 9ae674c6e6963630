use cefr_grader::models::{ClassifyRequest, LevelTag, WordLevel};
use cefr_grader::services::{
    classify, classify_request, clean, load_level_map, segment, ClassifyOptions, LevelMap,
    LexiconStore, StaticLexicon,
};
use cefr_grader::ClassifyError;

fn example_map() -> LevelMap {
    LevelMap::from_records(vec![
        WordLevel::new("the", LevelTag::A1),
        WordLevel::new("cat", LevelTag::A1),
        WordLevel::new("sat", LevelTag::A2),
        WordLevel::new("enigmatic", LevelTag::C1),
    ])
}

#[test]
fn end_to_end_example() {
    let text = "The cat sat. The cat sat. An enigmatic thought lingered!";
    let result = classify(text, &example_map()).unwrap();

    assert_eq!(result.sentences.len(), 2);
    assert_eq!(result.words.len(), 10);
    assert_eq!(result.sentences[0].level, LevelTag::A1);
    assert_eq!(result.sentences[1].level, LevelTag::A1);
    assert_eq!(
        result.sentences[1]
            .words
            .iter()
            .filter(|w| w.level == LevelTag::Unknown)
            .count(),
        3
    );
}

#[test]
fn result_wire_shape() {
    let result = classify("The cat sat.", &example_map()).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["sentences"][0]["raw"], "The cat sat.");
    assert_eq!(json["sentences"][0]["level"], "A1");
    assert_eq!(json["words"][2]["word"], "sat");
    assert_eq!(json["words"][2]["level"], "A2");

    let unknown = classify("zebra", &example_map()).unwrap();
    let json = serde_json::to_value(&unknown).unwrap();
    assert_eq!(json["words"][0]["level"], "unknown");
}

#[test]
fn determinism() {
    let text = "Hello there! Is it 3.5 or 4? Hello there. \"Quoted.\" End";
    let map = example_map();
    let first = classify(text, &map).unwrap();
    for _ in 0..5 {
        assert_eq!(classify(text, &map).unwrap(), first);
    }
}

#[test]
fn dedup_keeps_first_occurrence_position() {
    let sentences = segment("Good morning. How are you? good morning! Fine.");
    assert_eq!(sentences, vec!["Good morning.", "How are you?", "Fine."]);
}

#[test]
fn no_punctuation_fallback() {
    let result = classify("hello world", &example_map()).unwrap();
    assert_eq!(result.sentences.len(), 1);
    assert_eq!(result.sentences[0].raw, "hello world");
}

#[test]
fn aggregation_boundaries_through_pipeline() {
    let map = LevelMap::from_records(vec![
        WordLevel::new("easy", LevelTag::A1),
        WordLevel::new("fairly", LevelTag::A2),
        WordLevel::new("abstruse", LevelTag::C2),
    ]);
    let result = classify("Easy fairly. Abstruse abstruse. Unlisted words.", &map).unwrap();
    let levels: Vec<LevelTag> = result.sentences.iter().map(|s| s.level).collect();
    assert_eq!(levels, vec![LevelTag::A2, LevelTag::C2, LevelTag::Unknown]);
}

#[test]
fn cleaning_idempotence() {
    for w in ["", "a", "it's", "x-ray!", "42nd", "ÆON", "...", "Hello,World"] {
        let once = clean(w);
        assert_eq!(once.as_deref().and_then(clean), once);
    }
}

#[test]
fn empty_and_null_input_rejected() {
    let map = example_map();
    assert!(matches!(
        classify("", &map),
        Err(ClassifyError::InvalidInput(_))
    ));

    let null_body: ClassifyRequest = serde_json::from_str(r#"{"text": null}"#).unwrap();
    assert!(matches!(
        classify_request(&null_body, &map, &ClassifyOptions::default()),
        Err(ClassifyError::InvalidInput(_))
    ));
}

#[test]
fn whitespace_only_input_is_an_empty_result() {
    let result = classify(" \t\n  ", &example_map()).unwrap();
    assert!(result.sentences.is_empty());
    assert!(result.words.is_empty());

    let body: ClassifyRequest = serde_json::from_str(r#"{"text": "   "}"#).unwrap();
    let result = classify_request(&body, &example_map(), &ClassifyOptions::default()).unwrap();
    assert_eq!(serde_json::to_value(&result).unwrap(), serde_json::json!({"sentences": [], "words": []}));
}

#[test]
fn unavailable_lexicon_still_classifies() {
    let store = LexiconStore::from_provider(&StaticLexicon::default());
    let map = store.snapshot();
    let result = classify("The cat sat.", &map).unwrap();
    assert!(result.words.iter().all(|w| w.level == LevelTag::Unknown));
    assert_eq!(result.sentences[0].level, LevelTag::Unknown);

    let loaded = load_level_map(&StaticLexicon::new(vec![WordLevel::new("cat", LevelTag::B1)]));
    assert_eq!(classify("cat", &loaded).unwrap().words[0].level, LevelTag::B1);
}
