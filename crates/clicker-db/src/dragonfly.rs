//! `Dragonfly` (Redis-compatible) store backend.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `clicker:game_state` | JSON | Serialized [`GameRecord`] |
//! | `clicker:game_state:version` | Integer | Version of the stored record |
//!
//! The version lives in its own key so the compare-and-swap script can
//! check it without decoding JSON server-side. Both keys are only ever
//! written together inside one script invocation.

use fred::interfaces::LuaInterface;
use fred::prelude::*;

use clicker_types::{GAME_STATE_KEY, GameRecord};

use crate::error::DbError;
use crate::store::StateStore;

/// Writes the record and its version unless the record already exists.
///
/// `KEYS[1]` record key, `KEYS[2]` version key, `ARGV[1]` JSON,
/// `ARGV[2]` version. Returns 1 when written, 0 when skipped.
const CREATE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('SET', KEYS[1], ARGV[1])
redis.call('SET', KEYS[2], ARGV[2])
return 1
";

/// Replaces the record if the stored version matches.
///
/// `KEYS[1]` record key, `KEYS[2]` version key, `ARGV[1]` expected
/// version, `ARGV[2]` JSON, `ARGV[3]` new version. Returns 1 on success.
const CAS_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[2])
if current ~= ARGV[1] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[2])
redis.call('SET', KEYS[2], ARGV[3])
return 1
";

/// Key holding the version of the stored record.
fn version_key() -> String {
    format!("{GAME_STATE_KEY}:version")
}

/// Store backed by a `Dragonfly` instance.
///
/// Wraps a [`fred::prelude::Client`]; cloning shares the connection.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl core::fmt::Debug for DragonflyStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DragonflyStore").finish_non_exhaustive()
    }
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }

    /// Delete both keys. Used to reset a development instance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn reset(&self) -> Result<(), DbError> {
        let _: u32 = self
            .client
            .del(vec![GAME_STATE_KEY.to_owned(), version_key()])
            .await?;
        Ok(())
    }

    /// Close the connection gracefully.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the quit command fails.
    pub async fn close(&self) -> Result<(), DbError> {
        self.client.quit().await?;
        tracing::info!("Dragonfly connection closed");
        Ok(())
    }
}

impl StateStore for DragonflyStore {
    fn backend(&self) -> &'static str {
        "dragonfly"
    }

    async fn load(&self) -> Result<Option<GameRecord>, DbError> {
        let value: Option<String> = self.client.get(GAME_STATE_KEY).await?;
        value
            .map(|s| serde_json::from_str(&s).map_err(DbError::from))
            .transpose()
    }

    async fn create_if_absent(&self, initial: &GameRecord) -> Result<GameRecord, DbError> {
        let json = serde_json::to_string(initial)?;
        let created: i64 = self
            .client
            .eval(
                CREATE_SCRIPT,
                vec![GAME_STATE_KEY.to_owned(), version_key()],
                vec![json, initial.version.to_string()],
            )
            .await?;

        if created == 1 {
            tracing::info!("Created game state key");
        }

        self.load()
            .await?
            .ok_or_else(|| DbError::KeyNotFound(GAME_STATE_KEY.to_owned()))
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        next: &GameRecord,
    ) -> Result<bool, DbError> {
        let json = serde_json::to_string(next)?;
        let swapped: i64 = self
            .client
            .eval(
                CAS_SCRIPT,
                vec![GAME_STATE_KEY.to_owned(), version_key()],
                vec![expected_version.to_string(), json, next.version.to_string()],
            )
            .await?;

        Ok(swapped == 1)
    }
}
