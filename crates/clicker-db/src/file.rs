//! Embedded JSON file backend.
//!
//! The record lives in a single JSON file. Writes go to a temporary
//! sibling first and are moved into place with `rename`, so a crash
//! mid-write leaves either the old record or the new one, never a torn
//! file. An in-process mutex serializes every read-modify-write.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use clicker_types::GameRecord;
use tokio::sync::Mutex;

use crate::error::DbError;
use crate::store::StateStore;

/// Store backed by one JSON file on local disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store persisting to `path`. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<Option<GameRecord>, DbError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DbError::Io(e)),
        }
    }

    async fn write_record(&self, record: &GameRecord) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::trace!(path = %self.path.display(), version = record.version, "Wrote game state file");
        Ok(())
    }
}

impl StateStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Option<GameRecord>, DbError> {
        self.read_record().await
    }

    async fn create_if_absent(&self, initial: &GameRecord) -> Result<GameRecord, DbError> {
        let _guard = self.write_lock.lock().await;
        if let Some(existing) = self.read_record().await? {
            return Ok(existing);
        }
        self.write_record(initial).await?;
        tracing::info!(path = %self.path.display(), "Created game state file");
        Ok(initial.clone())
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameRecord,
    ) -> Result<bool, DbError> {
        let _guard = self.write_lock.lock().await;
        match self.read_record().await? {
            Some(current) if current.version == expected_version => {
                self.write_record(next).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
