//! State-synchronization engine for the Clicker server.
//!
//! This crate owns the only design-heavy part of the system: the rules
//! for mutating the shared game state, and the fan-out of every accepted
//! mutation to all live observers. It has no networking dependency; the
//! HTTP and `WebSocket` layers live in `clicker-api`.
//!
//! # Architecture
//!
//! ```text
//! Router --> SyncHub::produce / convert
//!               |
//!               +-- StateEngine::execute   (gate held, store CAS)
//!               |       returns Committed { snapshot, gate permit }
//!               |
//!               +-- Dispatcher::broadcast  (still under the gate)
//!               |       |
//!               |       +-- ConnectionRegistry (Open channels only,
//!               |                               failed ones pruned)
//!               |
//!               +-- drop(Committed)        (next command may start)
//! ```
//!
//! Holding the command gate across the broadcast gives every observer the
//! snapshots in commit order.
//!
//! # Modules
//!
//! - [`engine`] -- Command transitions and the serialized read-modify-write
//! - [`registry`] -- Observer channels and their lifecycle
//! - [`dispatcher`] -- Best-effort fan-out with pruning
//! - [`hub`] -- Facade tying the three together for the router
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- Engine error taxonomy

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod hub;
pub mod registry;

pub use config::{ClickerConfig, ConfigError, StoreBackend};
pub use dispatcher::{BroadcastReport, Dispatcher};
pub use engine::{Command, Committed, StateEngine};
pub use error::EngineError;
pub use hub::SyncHub;
pub use registry::{Channel, ChannelSendFailure, ChannelState, ConnectionRegistry, InvalidTransition};
