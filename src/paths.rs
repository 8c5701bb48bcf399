//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   config, data and logs in that directory.
//! - **Installed mode** (default): everything lives under the platform data
//!   directory, e.g. `%APPDATA%\Deck GW` or `~/.local/share/Deck GW`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "Deck GW";

/// Application paths for config, data and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Directory holding the persisted documents (or the sled database)
    pub data_dir: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        if exe_dir.join(".portable").exists() {
            return Self::portable(&exe_dir);
        }

        let base = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data directory, using the executable directory");
                exe_dir.clone()
            })
            .join(APP_NAME);
        Self::installed(&base)
    }

    /// Layout rooted next to the executable
    pub fn portable(exe_dir: &Path) -> Self {
        Self {
            config: exe_dir.join("config.yaml"),
            data_dir: exe_dir.join("data"),
            logs_dir: exe_dir.join("logs"),
            is_portable: true,
        }
    }

    /// Layout rooted in an application data directory
    pub fn installed(base: &Path) -> Self {
        Self {
            config: base.join("config.yaml"),
            data_dir: base.join("data"),
            logs_dir: base.join("logs"),
            is_portable: false,
        }
    }

    /// Replace the data directory (CLI flag or `storage.data_dir`)
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    /// Get the sled database path (within data_dir)
    pub fn sled_db_path(&self) -> PathBuf {
        self.data_dir.join("sled")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.data_dir, &self.logs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_portable_layout() {
        let paths = AppPaths::portable(Path::new("/opt/deck"));

        assert!(paths.is_portable);
        assert_eq!(paths.config, PathBuf::from("/opt/deck/config.yaml"));
        assert_eq!(paths.data_dir, PathBuf::from("/opt/deck/data"));
        assert_eq!(paths.sled_db_path(), PathBuf::from("/opt/deck/data/sled"));
    }

    #[test]
    fn test_data_dir_override() {
        let paths = AppPaths::installed(Path::new("/home/me/.local/share/Deck GW"))
            .with_data_dir(Some(PathBuf::from("/srv/deck")));

        assert!(!paths.is_portable);
        assert_eq!(paths.data_dir, PathBuf::from("/srv/deck"));
        assert_eq!(paths.logs_dir, PathBuf::from("/home/me/.local/share/Deck GW/logs"));
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let root = tempdir().unwrap();
        let paths = AppPaths::installed(&root.path().join("Deck GW"));

        paths.ensure_directories().unwrap();
        assert!(paths.data_dir.is_dir());
        assert!(paths.logs_dir.is_dir());
    }
}
