//! Storage layer for the Clicker game state.
//!
//! The state engine is storage-agnostic: it talks to a [`StateStore`] and
//! never names a backend. This crate provides the trait and four
//! interchangeable implementations.
//!
//! # Backends
//!
//! ```text
//! StateEngine
//!     |
//!     +-- StateStore (trait)
//!         |-- MemoryStore     (process lifetime)
//!         |-- FileStore       (embedded JSON file)
//!         |-- PostgresStore   (sqlx, versioned UPDATE)
//!         +-- DragonflyStore  (fred, Lua compare-and-swap)
//! ```
//!
//! Every backend holds exactly one record under
//! [`GAME_STATE_KEY`](clicker_types::GAME_STATE_KEY) and implements
//! compare-and-swap on its `version` field so that a write computed from a
//! stale read is refused instead of silently applied.
//!
//! # Modules
//!
//! - [`store`] -- The [`StateStore`] trait and runtime-selected [`AnyStore`]
//! - [`memory`] -- In-memory backend
//! - [`file`] -- JSON file backend
//! - [`postgres`] -- `PostgreSQL` backend
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyStore;
pub use error::DbError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresStore};
pub use store::{AnyStore, StateStore};
