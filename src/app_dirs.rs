use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "quizdeck";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/quizdeck`, or the platform local data dir.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("history.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|d| d.join("quizdeck.log"))
    }

    pub fn subjects_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_dir().join("subjects"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join("config.json"))
    }
}
