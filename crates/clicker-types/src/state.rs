//! The game-state snapshot and its persisted record layout.
//!
//! [`GameState`] is what clients see: two unsigned counters serialized as
//! `{ "currency": n, "resource": n }`. [`GameRecord`] wraps a snapshot with
//! the version and timestamp that stores use to order writes and detect
//! lost updates. The version is internal and never sent to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Fixed identifier of the single game-state record in every store.
pub const GAME_STATE_KEY: &str = "clicker:game_state";

/// Immutable copy of the game counters at one point in time.
///
/// Both counters are unsigned, so the non-negativity invariant holds by
/// construction. Used for HTTP responses and channel broadcasts alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Accumulated score, only ever increased by conversion.
    pub currency: u64,
    /// Spendable counter, increased by production and spent by conversion.
    pub resource: u64,
}

impl GameState {
    /// Canonical state of a freshly created game.
    pub const INITIAL: Self = Self {
        currency: 1,
        resource: 0,
    };

    /// Create a snapshot from explicit counter values.
    pub const fn new(currency: u64, resource: u64) -> Self {
        Self { currency, resource }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Persisted layout of the game-state record.
///
/// `version` starts at 0 when the record is created and increases by
/// exactly one per committed mutation. Stores compare it to reject writes
/// computed from a stale read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameRecord {
    /// Counter values.
    #[serde(flatten)]
    pub state: GameState,
    /// Monotonic write counter.
    pub version: u64,
    /// Wall-clock time of the last committed write.
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

impl GameRecord {
    /// Create a version-0 record holding `state`.
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            version: 0,
            last_modified: Utc::now(),
        }
    }

    /// Build the record that replaces this one after a mutation.
    ///
    /// Returns `None` only if the version counter is exhausted.
    pub fn next(&self, state: GameState) -> Option<Self> {
        Some(Self {
            state,
            version: self.version.checked_add(1)?,
            last_modified: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_wire_shape() {
        let json = serde_json::to_value(GameState::new(5, 2)).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({ "currency": 5, "resource": 2 }))
        );
    }

    #[test]
    fn initial_state_has_one_currency() {
        assert_eq!(GameState::default(), GameState::new(1, 0));
    }

    #[test]
    fn record_flattens_counters() {
        let record = GameRecord::new(GameState::new(3, 4));
        let json = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(json["currency"], 3);
        assert_eq!(json["resource"], 4);
        assert_eq!(json["version"], 0);
        assert!(json["lastModified"].is_string());
    }

    #[test]
    fn next_bumps_version_and_keeps_time_ordered() {
        let first = GameRecord::new(GameState::INITIAL);
        let second = first.next(GameState::new(1, 1));
        assert!(second.is_some());
        let second = second.unwrap_or_else(|| first.clone());
        assert_eq!(second.version, 1);
        assert_eq!(second.state, GameState::new(1, 1));
        assert!(second.last_modified >= first.last_modified);
    }

    #[test]
    fn next_refuses_exhausted_version() {
        let mut record = GameRecord::new(GameState::INITIAL);
        record.version = u64::MAX;
        assert!(record.next(GameState::INITIAL).is_none());
    }
}
