// Configuration Storage Service
// Handles config file read/write and version backup

use crate::error::ConfigError;
use crate::services::classifier::ClassifyOptions;
use crate::services::lexicon_builder::DEFAULT_BATCH_SIZE;
use crate::services::providers::OPENAI_DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "cefr-grader";
const BACKUPS_TO_KEEP: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub lexicon: LexiconConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub classify: ClassifyOptions,
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexiconConfig {
    #[serde(default = "default_words_file")]
    pub words_file: PathBuf,
    #[serde(default = "default_classified_file")]
    pub classified_file: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            words_file: default_words_file(),
            classified_file: default_classified_file(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// `name[:model]`
    #[serde(default = "default_provider")]
    pub spec: String,
    pub base_url: Option<String>,
    pub proxy: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            spec: default_provider(),
            base_url: None,
            proxy: None,
        }
    }
}

fn default_words_file() -> PathBuf { PathBuf::from("data").join("words.json") }
fn default_classified_file() -> PathBuf { PathBuf::from("data").join("classifiedWords.json") }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }
fn default_provider() -> String { format!("openai:{}", OPENAI_DEFAULT_MODEL) }

pub struct ConfigStore {
    config_dir: PathBuf,
    config_file: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        let config_file = config_dir.join("config.json");
        Self { config_dir, config_file }
    }

    /// Get default config directory
    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Ensure config directory exists
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }

    /// Load configuration; defaults when no file exists yet.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.config_file.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_file)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        if self.config_file.exists() {
            self.create_backup()?;
        }

        let content = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    fn create_backup(&self) -> Result<(), ConfigError> {
        let backup_dir = self.config_dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_file = backup_dir.join(format!("config_{}.json", timestamp));
        fs::copy(&self.config_file, &backup_file)?;

        self.cleanup_old_backups(&backup_dir, BACKUPS_TO_KEEP)
    }

    /// Remove old backups, keeping only the most recent N
    fn cleanup_old_backups(&self, backup_dir: &Path, keep: usize) -> Result<(), ConfigError> {
        let mut entries: Vec<_> = fs::read_dir(backup_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        if entries.len() <= keep {
            return Ok(());
        }

        // Oldest first
        entries.sort_by_key(|e| {
            e.metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
        });

        for entry in entries.iter().take(entries.len() - keep) {
            let _ = fs::remove_file(entry.path());
        }

        Ok(())
    }

    pub fn set_api_key(&self, provider: &str, key: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.insert(provider.to_string(), key.to_string());
        self.save(&config)
    }

    pub fn delete_api_key(&self, provider: &str) -> Result<(), ConfigError> {
        let mut config = self.load()?;
        config.api_keys.remove(provider);
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{parse_provider, ChatModel, ProviderClient};
    use crate::services::sentence_segmenter::SegmentationMode;

    fn temp_store() -> (ConfigStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("cefr_config_{}", uuid::Uuid::new_v4()));
        (ConfigStore::new(dir.clone()), dir)
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.lexicon.batch_size, 200);
        assert_eq!(config.provider.spec, "openai:gpt-4o-mini");
        assert_eq!(config.classify.segmentation, SegmentationMode::Lookahead);
        assert!(!config.classify.strict_charset);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"classify":{"segmentation":"pattern"},"lexicon":{"batchSize":50}}"#)
                .unwrap();
        assert_eq!(parsed.classify.segmentation, SegmentationMode::Pattern);
        assert_eq!(parsed.lexicon.batch_size, 50);
        assert_eq!(parsed.lexicon.words_file, default_words_file());
    }

    #[test]
    fn test_load_missing_returns_default() {
        let (store, _dir) = temp_store();
        let config = store.load().unwrap();
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_save_load_and_backup() {
        let (store, dir) = temp_store();
        store.set_api_key("openai", "sk-test").unwrap();
        assert_eq!(
            store.load().unwrap().api_keys.get("openai").map(String::as_str),
            Some("sk-test")
        );

        store.delete_api_key("openai").unwrap();
        assert!(store.load().unwrap().api_keys.get("openai").is_none());

        let backups = fs::read_dir(dir.join("backups")).unwrap().count();
        assert_eq!(backups, 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_key_in_custom_config_dir_reaches_chat_model() {
        let env_key_set = ["OPENAI_API_KEY", "CEFR_OPENAI_API_KEY"]
            .iter()
            .any(|k| std::env::var(k).map(|v| !v.trim().is_empty()).unwrap_or(false));
        if env_key_set {
            return;
        }

        let (store, dir) = temp_store();
        store.set_api_key("openai", "sk-custom-dir").unwrap();

        let config = store.load().unwrap();
        let spec = parse_provider("openai").unwrap();
        let chat = ChatModel::from_spec(ProviderClient::new(), &spec, &config.api_keys);
        assert!(chat.is_ok());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_cleanup_old_backups_removes_oldest() {
        let (store, dir) = temp_store();
        let backup_dir = dir.join("backups");
        fs::create_dir_all(&backup_dir).unwrap();

        for i in 0..5u64 {
            let path = backup_dir.join(format!("config_{}.json", i));
            fs::write(&path, "{}").unwrap();
            let file = fs::File::options().write(true).open(&path).unwrap();
            file.set_modified(std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_000 + i))
                .unwrap();
        }
        fs::write(backup_dir.join("notes.txt"), "keep").unwrap();

        store.cleanup_old_backups(&backup_dir, 2).unwrap();

        let mut remaining: Vec<String> = fs::read_dir(&backup_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec!["config_3.json", "config_4.json", "notes.txt"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_repeated_saves_cap_backups() {
        let (store, dir) = temp_store();
        for i in 0..(BACKUPS_TO_KEEP + 3) {
            let config = AppConfig {
                version: format!("1.0.{}", i),
                ..Default::default()
            };
            store.save(&config).unwrap();
        }

        let backups = fs::read_dir(dir.join("backups")).unwrap().count();
        assert!(backups >= 1 && backups <= BACKUPS_TO_KEEP);
        assert_eq!(store.load().unwrap().version, format!("1.0.{}", BACKUPS_TO_KEEP + 2));

        let _ = fs::remove_dir_all(&dir);
    }
}
