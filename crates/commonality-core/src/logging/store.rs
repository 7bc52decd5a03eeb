//! Storage backend abstraction for session logs.
//!
//! The session logger never touches the filesystem directly. Everything
//! goes through [`LogStore`], which makes the logger testable with the
//! in-memory store below or with a fault-injecting store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::session_id::SessionId;
use crate::error::{CoreError, CoreResult};

/// Persistence used by the session logger.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Create a new session and write its first line.
    async fn create(&self, session: SessionId, first_line: String) -> CoreResult<()>;

    /// Append lines, in order, to an existing session.
    async fn append(&self, session: SessionId, lines: Vec<String>) -> CoreResult<()>;

    /// All known sessions, oldest first.
    async fn list_sessions(&self) -> CoreResult<Vec<SessionId>>;

    /// Every line of one session, in write order.
    async fn read_contents(&self, session: SessionId) -> CoreResult<Vec<String>>;
}

/// Log store that keeps every session in memory.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    sessions: Mutex<BTreeMap<SessionId, Vec<String>>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn create(&self, session: SessionId, first_line: String) -> CoreResult<()> {
        self.sessions.lock().insert(session, vec![first_line]);
        Ok(())
    }

    async fn append(&self, session: SessionId, lines: Vec<String>) -> CoreResult<()> {
        let mut sessions = self.sessions.lock();
        let contents = sessions
            .get_mut(&session)
            .ok_or(CoreError::SessionNotFound(session))?;
        contents.extend(lines);
        Ok(())
    }

    async fn list_sessions(&self) -> CoreResult<Vec<SessionId>> {
        Ok(self.sessions.lock().keys().copied().collect())
    }

    async fn read_contents(&self, session: SessionId) -> CoreResult<Vec<String>> {
        self.sessions
            .lock()
            .get(&session)
            .cloned()
            .ok_or(CoreError::SessionNotFound(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_create_and_append() {
        let store = MemoryLogStore::new();
        let id = SessionId::from_ticks(42).unwrap();

        store.create(id, "first".into()).await.unwrap();
        store
            .append(id, vec!["second".into(), "third".into()])
            .await
            .unwrap();

        assert_eq!(store.list_sessions().await.unwrap(), vec![id]);
        assert_eq!(
            store.read_contents(id).await.unwrap(),
            vec!["first", "second", "third"]
        );
    }

    #[tokio::test]
    async fn test_memory_store_unknown_session() {
        let store = MemoryLogStore::new();
        let id = SessionId::from_ticks(7).unwrap();

        assert!(matches!(
            store.append(id, vec!["orphan".into()]).await,
            Err(CoreError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.read_contents(id).await,
            Err(CoreError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_lists_oldest_first() {
        let store = MemoryLogStore::new();
        for ticks in [30, 10, 20] {
            store
                .create(SessionId::from_ticks(ticks).unwrap(), "Created".into())
                .await
                .unwrap();
        }

        let ticks: Vec<_> = store
            .list_sessions()
            .await
            .unwrap()
            .iter()
            .map(SessionId::ticks)
            .collect();
        assert_eq!(ticks, vec![10, 20, 30]);
    }
}
