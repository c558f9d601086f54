use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "shelltype";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/shelltype`, falling back to the platform data dir.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn history_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("typing_history.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("shelltype.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_in_the_state_dir() {
        if let Some(dir) = AppDirs::state_dir() {
            assert_eq!(
                AppDirs::history_path().unwrap(),
                dir.join("typing_history.json")
            );
            assert_eq!(AppDirs::log_path().unwrap(), dir.join("shelltype.log"));
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
