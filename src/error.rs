//! Error types for the typing engine and its storage collaborators.
//!
//! None of these abort a session: word-list and history failures are
//! recovered by the callers with safe defaults, while [`SessionError`]
//! signals a broken engine invariant that tests should catch.

use std::path::PathBuf;

use thiserror::Error;

/// Raised by [`crate::session::TypingSession`] when its own state is inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// A session cannot be started without any target words.
    #[error("cannot start a session with an empty word list")]
    EmptyWordList,

    /// The word cursor moved past the end while the session was still running.
    #[error("word index {index} out of range for {len} words")]
    WordIndexOutOfRange { index: usize, len: usize },
}

/// Failures while loading a word list.
#[derive(Debug, Error)]
pub enum WordListError {
    /// No bundled list exists under this name.
    #[error("no bundled word list named {0}")]
    UnknownBundled(String),

    #[error("failed to read word list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bundled word list {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// The list was read successfully but contains nothing to type.
    #[error("word list {0} is empty")]
    Empty(String),
}

/// Failures while reading or writing the result history.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to access history at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history at {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Failures while driving a session from terminal events.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("failed to render: {0}")]
    Render(#[from] std::io::Error),
}

/// Failures while persisting the user configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to write config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}
