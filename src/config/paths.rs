//! Settings file location.
//!
//! A `settings.toml` in the working directory wins; otherwise the per-user
//! file under the platform config dir is used:
//!
//!   Windows: %APPDATA%\meeting-codeswitch\settings.toml
//!   macOS:   ~/Library/Application Support/meeting-codeswitch/settings.toml
//!   Linux:   ~/.config/meeting-codeswitch/settings.toml

use std::path::{Path, PathBuf};

const APP_NAME: &str = "meeting-codeswitch";
const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Per-user config directory.
    pub config_dir: PathBuf,
    /// Per-user `settings.toml`.
    pub settings_file: PathBuf,
}

impl AppPaths {
    /// Falls back to the current directory when the platform has no config
    /// dir.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME);
        Self {
            settings_file: config_dir.join(SETTINGS_FILE),
            config_dir,
        }
    }

    /// `settings.toml` in `dir` if it exists, else the per-user file.
    pub fn locate_settings(&self, dir: &Path) -> PathBuf {
        let local = dir.join(SETTINGS_FILE);
        if local.is_file() {
            local
        } else {
            self.settings_file.clone()
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
