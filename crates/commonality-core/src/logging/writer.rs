//! Filesystem-backed log store.
//!
//! Each session gets its own append-only text file named after its
//! identifier: `Logs/08d5918cb7545700.txt`. The logger serializes all
//! writes, so this store never sees two writers on one file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::session_id::SessionId;
use super::store::LogStore;
use crate::config::LoggerConfig;
use crate::error::{CoreError, CoreResult};

/// Log store writing one text file per session.
#[derive(Debug, Clone)]
pub struct FileLogStore {
    /// Directory holding the session files
    logs_dir: PathBuf,
}

impl FileLogStore {
    /// Store under `<home>/Logs`.
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self::from_config(&LoggerConfig::new(home.as_ref()))
    }

    pub fn from_config(config: &LoggerConfig) -> Self {
        Self {
            logs_dir: config.logs_dir(),
        }
    }

    /// Get the directory holding the session files.
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Get the path of one session's file.
    pub fn session_path(&self, session: SessionId) -> PathBuf {
        self.logs_dir.join(session.file_name())
    }
}

fn to_text(lines: &[String]) -> String {
    let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

#[async_trait]
impl LogStore for FileLogStore {
    async fn create(&self, session: SessionId, first_line: String) -> CoreResult<()> {
        fs::create_dir_all(&self.logs_dir).await?;

        let mut file = fs::File::create(self.session_path(session)).await?;
        file.write_all(to_text(&[first_line]).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn append(&self, session: SessionId, lines: Vec<String>) -> CoreResult<()> {
        fs::create_dir_all(&self.logs_dir).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.session_path(session))
            .await?;
        // One buffer per batch keeps an entry's lines together on disk.
        file.write_all(to_text(&lines).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn list_sessions(&self) -> CoreResult<Vec<SessionId>> {
        let mut dir = match fs::read_dir(&self.logs_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name
                .to_str()
                .ok_or_else(|| CoreError::MalformedSessionName(name.to_string_lossy().into()))?;
            sessions.push(SessionId::from_file_name(name)?);
        }

        sessions.sort();
        Ok(sessions)
    }

    async fn read_contents(&self, session: SessionId) -> CoreResult<Vec<String>> {
        let content = match fs::read_to_string(self.session_path(session)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CoreError::SessionNotFound(session))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(content.lines().map(str::to_string).collect())
    }
}
