//! Error types.
//!
//! Only rule violations are errors. A wrong answer is an ordinary
//! [`crate::types::TrialOutcome`], and stray input is reported as
//! [`crate::session::Transition::Ignored`].

use std::path::PathBuf;

use crate::types::Category;

/// Invalid setup. Fatal at session start: no trials are generated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A category has no words, so its blocks would present nothing.
    #[error("catalog has no words for category `{0}`")]
    EmptyCategory(Category),

    /// A word is empty or whitespace.
    #[error("catalog contains a blank word in category `{0}`")]
    BlankWord(Category),

    /// A word appears more than once across the catalog.
    #[error("catalog word `{word}` appears more than once")]
    DuplicateWord {
        /// The repeated word.
        word: String,
    },

    /// Block ordinal outside 1..=4.
    #[error("block number must be between 1 and 4, got {0}")]
    InvalidBlock(i64),

    /// Catalog file could not be read.
    #[error("cannot read catalog file {}: {source}", path.display())]
    CatalogIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Catalog file is not valid catalog JSON.
    #[error("cannot parse catalog file {}: {source}", path.display())]
    CatalogParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Key bindings that are empty or bind both sides to the same key.
    #[error("key bindings must be two distinct non-empty keys, got `{left}` and `{right}`")]
    InvalidKeyBindings { left: String, right: String },

    /// Environment variable set to an unusable value.
    #[error("invalid value for {var}: `{value}`")]
    InvalidEnv { var: &'static str, value: String },
}

/// Failure to persist an outcome. Recoverable: the session keeps the outcome
/// in memory and carries on.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("result log write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("result row encoding failed: {0}")]
    Csv(#[from] csv::Error),

    /// Another handle kept the log locked for longer than the lock timeout.
    #[error("result log {} stayed locked for {waited_ms} ms", path.display())]
    LockTimeout { path: PathBuf, waited_ms: u128 },

    /// An existing log starts with a different header row.
    #[error("result log {} has unexpected header `{found}`", path.display())]
    HeaderMismatch { path: PathBuf, found: String },
}
