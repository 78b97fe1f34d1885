//! The [`StateStore`] contract and the runtime-selected [`AnyStore`].
//!
//! A store is a passive holder of the single [`GameRecord`]. It offers a
//! read, an insert-if-absent used once at startup, and a versioned
//! compare-and-swap. It never evaluates game rules; the engine owns those
//! and is the only caller that writes.

use std::future::Future;

use clicker_types::GameRecord;

use crate::dragonfly::DragonflyStore;
use crate::error::DbError;
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::postgres::PostgresStore;

/// Durable holder of the global game-state record.
///
/// Implementations must make [`compare_and_swap`](Self::compare_and_swap)
/// atomic with respect to other writers of the same record.
pub trait StateStore: Send + Sync + 'static {
    /// Short backend name used in log fields.
    fn backend(&self) -> &'static str;

    /// Read the current record, or `None` if it has never been created.
    fn load(&self) -> impl Future<Output = Result<Option<GameRecord>, DbError>> + Send;

    /// Insert `initial` unless a record already exists.
    ///
    /// Returns the record that is stored once the call completes, which
    /// is the pre-existing one when the insert was skipped.
    fn create_if_absent(
        &self,
        initial: &GameRecord,
    ) -> impl Future<Output = Result<GameRecord, DbError>> + Send;

    /// Replace the record with `next` if its stored version equals
    /// `expected_version`.
    ///
    /// Returns `Ok(false)` when another write committed first (or the
    /// record is missing); nothing is modified in that case.
    fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameRecord,
    ) -> impl Future<Output = Result<bool, DbError>> + Send;
}

/// A store backend chosen at runtime from configuration.
#[derive(Debug)]
pub enum AnyStore {
    /// Process-lifetime memory store.
    Memory(MemoryStore),
    /// Embedded JSON file.
    File(FileStore),
    /// `PostgreSQL` table.
    Postgres(PostgresStore),
    /// `Dragonfly` key.
    Dragonfly(DragonflyStore),
}

impl AnyStore {
    /// Release the backend's connections. A no-op for the embedded stores.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the quit command fails.
    pub async fn close(&self) -> Result<(), DbError> {
        match self {
            Self::Memory(_) | Self::File(_) => Ok(()),
            Self::Postgres(store) => {
                store.close().await;
                Ok(())
            }
            Self::Dragonfly(store) => store.close().await,
        }
    }
}

impl StateStore for AnyStore {
    fn backend(&self) -> &'static str {
        match self {
            Self::Memory(store) => store.backend(),
            Self::File(store) => store.backend(),
            Self::Postgres(store) => store.backend(),
            Self::Dragonfly(store) => store.backend(),
        }
    }

    async fn load(&self) -> Result<Option<GameRecord>, DbError> {
        match self {
            Self::Memory(store) => store.load().await,
            Self::File(store) => store.load().await,
            Self::Postgres(store) => store.load().await,
            Self::Dragonfly(store) => store.load().await,
        }
    }

    async fn create_if_absent(&self, initial: &GameRecord) -> Result<GameRecord, DbError> {
        match self {
            Self::Memory(store) => store.create_if_absent(initial).await,
            Self::File(store) => store.create_if_absent(initial).await,
            Self::Postgres(store) => store.create_if_absent(initial).await,
            Self::Dragonfly(store) => store.create_if_absent(initial).await,
        }
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameRecord,
    ) -> Result<bool, DbError> {
        match self {
            Self::Memory(store) => store.compare_and_swap(expected_version, next).await,
            Self::File(store) => store.compare_and_swap(expected_version, next).await,
            Self::Postgres(store) => store.compare_and_swap(expected_version, next).await,
            Self::Dragonfly(store) => store.compare_and_swap(expected_version, next).await,
        }
    }
}

impl From<MemoryStore> for AnyStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<FileStore> for AnyStore {
    fn from(store: FileStore) -> Self {
        Self::File(store)
    }
}

impl From<PostgresStore> for AnyStore {
    fn from(store: PostgresStore) -> Self {
        Self::Postgres(store)
    }
}

impl From<DragonflyStore> for AnyStore {
    fn from(store: DragonflyStore) -> Self {
        Self::Dragonfly(store)
    }
}

#[cfg(test)]
mod tests {
    use clicker_types::GameState;

    use super::*;

    #[tokio::test]
    async fn any_store_delegates_to_memory() {
        let store = AnyStore::from(MemoryStore::new());
        assert_eq!(store.backend(), "memory");
        assert!(store.load().await.ok().flatten().is_none());

        let created = store
            .create_if_absent(&GameRecord::new(GameState::INITIAL))
            .await
            .ok();
        assert_eq!(created.map(|r| r.state), Some(GameState::INITIAL));
    }

    #[tokio::test]
    async fn closing_embedded_store_keeps_record() {
        let store = AnyStore::from(MemoryStore::with_record(GameRecord::new(GameState::new(3, 4))));
        assert!(store.close().await.is_ok());
        let record = store.load().await.ok().flatten();
        assert_eq!(record.map(|r| r.state), Some(GameState::new(3, 4)));
    }
}
