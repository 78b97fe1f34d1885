//! In-memory store backend.
//!
//! Holds the record for the lifetime of the process. Suitable for local
//! play and tests; state is lost on restart.

use clicker_types::GameRecord;
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::StateStore;

/// Process-lifetime store guarded by a [`RwLock`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RwLock<Option<GameRecord>>,
}

impl MemoryStore {
    /// Create an empty store (no record yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `record`.
    pub fn with_record(record: GameRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

impl StateStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Option<GameRecord>, DbError> {
        Ok(self.record.read().await.clone())
    }

    async fn create_if_absent(&self, initial: &GameRecord) -> Result<GameRecord, DbError> {
        let mut slot = self.record.write().await;
        Ok(slot.get_or_insert_with(|| initial.clone()).clone())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameRecord,
    ) -> Result<bool, DbError> {
        let mut slot = self.record.write().await;
        match slot.as_ref() {
            Some(current) if current.version == expected_version => {
                *slot = Some(next.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use clicker_types::GameState;

    use super::*;

    #[tokio::test]
    async fn create_if_absent_keeps_existing_record() {
        let existing = GameRecord::new(GameState::new(5, 2));
        let store = MemoryStore::with_record(existing.clone());

        let stored = store
            .create_if_absent(&GameRecord::new(GameState::INITIAL))
            .await
            .ok();
        assert_eq!(stored, Some(existing));
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_version() {
        let store = MemoryStore::new();
        let base = GameRecord::new(GameState::INITIAL);
        let _ = store.create_if_absent(&base).await;

        let first = base.next(GameState::new(1, 1));
        let first = first.unwrap_or_else(|| base.clone());
        assert!(matches!(store.compare_and_swap(0, &first).await, Ok(true)));

        // A second writer that also read version 0 must be refused.
        let stale = base.next(GameState::new(1, 7));
        let stale = stale.unwrap_or_else(|| base.clone());
        assert!(matches!(store.compare_and_swap(0, &stale).await, Ok(false)));

        let current = store.load().await.ok().flatten();
        assert_eq!(current.map(|r| r.state), Some(GameState::new(1, 1)));
    }

    #[tokio::test]
    async fn compare_and_swap_on_missing_record_is_refused() {
        let store = MemoryStore::new();
        let next = GameRecord::new(GameState::INITIAL);
        assert!(matches!(store.compare_and_swap(0, &next).await, Ok(false)));
        assert!(store.load().await.ok().flatten().is_none());
    }
}
