use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::HistoryError;
use crate::runtime::Clock;
use crate::session::TypingSession;
use crate::util::round2;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Immutable summary of one finished session, as persisted in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub date: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub time_limit: u64,
    pub word_source: String,
    pub elapsed_time: f64,
    #[serde(default)]
    pub consistency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wpm_raw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorrect_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backspaces: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words_completed: Option<usize>,
}

impl SessionResult {
    /// Snapshot of a session's final numbers, floats rounded to two places.
    pub fn from_session<C: Clock>(session: &TypingSession<C>, date: DateTime<Local>) -> Self {
        let stats = session.stats();
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            wpm: round2(stats.wpm),
            accuracy: round2(stats.accuracy()),
            time_limit: session.time_limit().as_secs(),
            word_source: session.word_source().id(),
            elapsed_time: round2(session.elapsed().as_secs_f64()),
            consistency: round2(stats.consistency),
            wpm_raw: Some(round2(stats.wpm_raw)),
            char_accuracy: Some(round2(stats.char_accuracy())),
            correct_chars: Some(stats.correct_chars()),
            incorrect_chars: Some(stats.incorrect_chars()),
            backspaces: Some(session.recorder().backspaces()),
            words_completed: Some(session.current_word_index()),
        }
    }
}

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub path: PathBuf,
    /// Number of results in the store after the save.
    pub entries: usize,
    /// Where an unreadable previous store was moved before starting afresh.
    pub recovered_to: Option<PathBuf>,
}

/// Append-only JSON store of [`SessionResult`]s.
#[derive(Debug, Clone)]
pub struct ResultManager {
    path: PathBuf,
}

impl ResultManager {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the store. A missing file is an empty history.
    pub fn load_history(&self) -> Result<Vec<SessionResult>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_slice(&bytes).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// All results in insertion order; empty when the store is absent or unreadable.
    pub fn get_history(&self) -> Vec<SessionResult> {
        self.load_history().unwrap_or_else(|e| {
            tracing::warn!("ignoring unreadable history: {e}");
            Vec::new()
        })
    }

    /// Appends `result` and rewrites the store through a temp file and rename.
    ///
    /// An unreadable existing store is moved aside to a `.corrupt-<timestamp>`
    /// sibling and history restarts from this result. The new collection is
    /// serialized before anything on disk is touched.
    pub fn save_result(&self, result: &SessionResult) -> Result<SaveReport, HistoryError> {
        let (mut history, unreadable) = match self.load_history() {
            Ok(history) => (history, false),
            Err(e) => {
                tracing::warn!("existing history unreadable, starting a new one: {e}");
                (Vec::new(), true)
            }
        };

        history.push(result.clone());
        let data = serde_json::to_vec_pretty(&history).map_err(HistoryError::Serialize)?;

        let recovered_to = if unreadable {
            Some(self.preserve_unreadable()?)
        } else {
            None
        };

        self.write_atomically(&data)?;
        tracing::info!(
            "saved result #{} to {}",
            history.len(),
            self.path.display()
        );

        Ok(SaveReport {
            path: self.path.clone(),
            entries: history.len(),
            recovered_to,
        })
    }

    fn preserve_unreadable(&self) -> Result<PathBuf, HistoryError> {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", Local::now().format("%Y%m%d%H%M%S%3f")));
        let backup = self.path.with_file_name(name);

        fs::rename(&self.path, &backup).map_err(|source| HistoryError::Io {
            path: backup.clone(),
            source,
        })?;
        tracing::warn!("moved unreadable history to {}", backup.display());

        Ok(backup)
    }

    fn write_atomically(&self, data: &[u8]) -> Result<(), HistoryError> {
        let io_err = |source: std::io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(data).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}
