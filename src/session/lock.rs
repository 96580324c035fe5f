use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::UserId;

/// Entries are pruned once the map grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

/// Per-user advisory locks held for the read-modify-write span of a turn.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(user_id).or_default().clone()
        };
        tracing::trace!(user_id, "Waiting for session lock");
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_is_serialized() {
        let locks = Arc::new(UserLocks::new());
        let guard = locks.acquire(1).await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2)).await;
        assert!(b.is_ok());
    }
}
