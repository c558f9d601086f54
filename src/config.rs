use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use crate::runtime::DEFAULT_TICK_RATE_MS;
use crate::session::SessionConfig;
use crate::word_source::WordSourceKind;

pub const DEFAULT_TIME_LIMIT_SECS: u64 = 60;

/// Persisted user preferences. Missing fields take their defaults so older
/// files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub time_limit: u64,
    pub word_source: WordSourceKind,
    /// Open the menu instead of starting a test straight away.
    pub menu: bool,
    /// Directory of `<source>.txt` lists replacing the bundled ones.
    pub word_list_dir: Option<PathBuf>,
    pub history_path: Option<PathBuf>,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            word_source: WordSourceKind::default(),
            menu: false,
            word_list_dir: None,
            history_path: None,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
        }
    }
}

impl Config {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.time_limit, self.word_source)
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_path.clone().or_else(AppDirs::history_path)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("shelltype_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Config::default(),
            Err(e) => {
                tracing::warn!("could not read config {}: {e}", self.path.display());
                return Config::default();
            }
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("ignoring invalid config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(ConfigError::Serialize)?;
        fs::write(&self.path, data).map_err(io_err)
    }
}
