// Lexicon
// Word -> level lookup built from externally supplied records, plus the
// sources that supply them and a swappable snapshot holder.

use crate::error::LexiconError;
use crate::models::{LevelTag, WordLevel};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Immutable, case-insensitive word -> level map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    levels: HashMap<String, LevelTag>,
}

impl LevelMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from records; later records for the same word win.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = WordLevel>,
    {
        let mut levels = HashMap::new();
        for record in records {
            let key = record.word.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            levels.insert(key, record.level);
        }
        Self { levels }
    }

    pub fn get(&self, word: &str) -> Option<LevelTag> {
        if let Some(level) = self.levels.get(word) {
            return Some(*level);
        }
        self.levels.get(&word.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl FromIterator<WordLevel> for LevelMap {
    fn from_iter<T: IntoIterator<Item = WordLevel>>(iter: T) -> Self {
        Self::from_records(iter)
    }
}

/// Anything that can hand out `{word, level}` records.
pub trait LexiconProvider {
    fn name(&self) -> &str;
    fn load(&self) -> Result<Vec<WordLevel>, LexiconError>;
}

/// Records kept in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticLexicon {
    records: Vec<WordLevel>,
}

impl StaticLexicon {
    pub fn new(records: Vec<WordLevel>) -> Self {
        Self { records }
    }
}

impl LexiconProvider for StaticLexicon {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Vec<WordLevel>, LexiconError> {
        Ok(self.records.clone())
    }
}

/// JSON array of `{word, level}` on disk (the classified words file).
#[derive(Debug, Clone)]
pub struct JsonFileLexicon {
    path: PathBuf,
}

impl JsonFileLexicon {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LexiconProvider for JsonFileLexicon {
    fn name(&self) -> &str {
        "json-file"
    }

    fn load(&self) -> Result<Vec<WordLevel>, LexiconError> {
        let content = fs::read_to_string(&self.path)?;
        let records: Vec<WordLevel> = serde_json::from_str(&content)?;
        Ok(records)
    }
}

/// Build a level map, degrading to an empty map when the source fails or is
/// empty so classification still succeeds with every word `unknown`.
pub fn load_level_map(provider: &dyn LexiconProvider) -> LevelMap {
    let records = match provider.load() {
        Ok(records) if records.is_empty() => {
            warn!(provider = provider.name(), error = %LexiconError::Empty, "lexicon.unavailable");
            return LevelMap::empty();
        }
        Ok(records) => records,
        Err(e) => {
            warn!(provider = provider.name(), error = %e, "lexicon.unavailable");
            return LevelMap::empty();
        }
    };

    let record_count = records.len();
    let map = LevelMap::from_records(records);
    info!(
        provider = provider.name(),
        records = record_count,
        words = map.len(),
        "lexicon.loaded"
    );
    map
}

/// Holds the current level map snapshot. Readers get an `Arc` that stays
/// valid for their whole request; `reload` swaps in a fresh map.
#[derive(Debug, Default)]
pub struct LexiconStore {
    current: RwLock<Arc<LevelMap>>,
    reload_lock: std::sync::Mutex<()>,
}

impl LexiconStore {
    pub fn new(map: LevelMap) -> Self {
        Self {
            current: RwLock::new(Arc::new(map)),
            reload_lock: std::sync::Mutex::new(()),
        }
    }

    pub fn from_provider(provider: &dyn LexiconProvider) -> Self {
        Self::new(load_level_map(provider))
    }

    pub fn snapshot(&self) -> Arc<LevelMap> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Rebuild from the provider and swap. Concurrent reloads are serialised;
    /// the (possibly slow) load happens outside the read/write lock.
    pub fn reload(&self, provider: &dyn LexiconProvider) -> Arc<LevelMap> {
        let _writer = match self.reload_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let fresh = Arc::new(load_level_map(provider));
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::clone(&fresh),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&fresh),
        }
        fresh
    }
}
