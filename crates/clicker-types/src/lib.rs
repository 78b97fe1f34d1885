//! Shared type definitions for the Clicker server.
//!
//! This crate is the single source of truth for the game-state snapshot
//! pushed to clients and the record layout persisted by every store
//! backend. Types flow downstream to `TypeScript` via `ts-rs` for the
//! browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for observer channel identifiers
//! - [`state`] -- [`GameState`] snapshot and [`GameRecord`] persisted layout

pub mod ids;
pub mod state;

pub use ids::ChannelId;
pub use state::{GAME_STATE_KEY, GameRecord, GameState};
