// cefr-grader Core Services

pub mod tokenizer;
pub mod sentence_segmenter;
pub mod aggregation;
pub mod classifier;
pub mod lexicon;
pub mod lexicon_builder;
pub mod providers;
pub mod config_store;

pub use aggregation::{aggregate, average_weight, level_from_average};
pub use classifier::{classify, classify_request, classify_with_options, validate_text, ClassifyOptions};
pub use config_store::*;
pub use lexicon::{load_level_map, JsonFileLexicon, LevelMap, LexiconProvider, LexiconStore, StaticLexicon};
pub use lexicon_builder::{parse_classification_response, LexiconBuilder, ParseOutcome, RefreshSummary};
pub use providers::{parse_provider, ChatCompletion, ChatModel, ProviderClient, ProviderError, ProviderSpec};
pub use sentence_segmenter::{dedup_key, segment, segment_by_pattern, segment_with_mode, SegmentationMode};
pub use tokenizer::{classify_word, classify_words, clean, tokenize};
