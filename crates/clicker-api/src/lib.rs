//! Command router for the Clicker server.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** (`GET /`, `POST /produce`, `POST /convert`) that
//!   translate requests into [`SyncHub`](clicker_core::SyncHub) calls and
//!   engine results into responses
//! - **`WebSocket` endpoint** (`GET /ws`) that registers one observer
//!   channel per connection and streams every committed snapshot
//!
//! # Architecture
//!
//! Handlers hold no game logic. Mutating commands are run on a spawned
//! task so that a client hanging up mid-request never cancels a
//! read-modify-write halfway; the hub broadcasts the result before the
//! handler responds.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use state::AppState;
