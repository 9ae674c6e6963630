// Error taxonomy for classification, lexicon loading and configuration.
// Provider (network) errors live next to the client in services::providers.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Error, Debug)]
pub enum LexiconError {
    #[error("Lexicon I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lexicon JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Lexicon source is empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
