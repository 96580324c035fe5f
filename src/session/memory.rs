use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Session, SessionStore, UserId, DEFAULT_HISTORY_CAP};

/// Process-local session store for single-instance deployments and tests.
pub struct MemoryStore {
    sessions: RwLock<HashMap<UserId, Session>>,
    history_cap: usize,
}

impl MemoryStore {
    pub fn new(history_cap: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history_cap: history_cap.max(1),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, user_id: UserId) -> Result<Option<Session>> {
        tracing::trace!(user_id, "Loading session from memory");
        Ok(self.sessions.read().await.get(&user_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        tracing::trace!(user_id = session.user_id, "Saving session to memory");
        self.sessions
            .write()
            .await
            .insert(session.user_id, session.clone());
        Ok(())
    }

    fn history_cap(&self) -> usize {
        self.history_cap
    }
}
