//! Logger configuration.

use std::path::{Path, PathBuf};

/// Default name of the directory, under the home directory, holding session logs.
pub const DEFAULT_LOGS_DIR_NAME: &str = "Logs";

/// Where session logs live on disk.
///
/// ```text
/// ~/.commonality/
/// └── Logs/
///     ├── 08d5918cb7545700.txt
///     └── 08d5918d0a1f3c80.txt
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Home directory (e.g., "~/.commonality")
    pub home: PathBuf,

    /// Subdirectory of `home` holding one file per session
    pub logs_dir_name: String,
}

impl LoggerConfig {
    /// Configuration rooted at `home`.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            logs_dir_name: DEFAULT_LOGS_DIR_NAME.to_string(),
        }
    }

    /// Override the logs subdirectory name.
    pub fn with_logs_dir_name(mut self, name: impl Into<String>) -> Self {
        self.logs_dir_name = name.into();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directory holding the session files.
    pub fn logs_dir(&self) -> PathBuf {
        self.home.join(&self.logs_dir_name)
    }
}

impl Default for LoggerConfig {
    /// `~/.commonality`, or `./.commonality` when there is no home directory.
    fn default() -> Self {
        Self::new(
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".commonality"),
        )
    }
}
