//! Error taxonomy for the state engine.
//!
//! [`EngineError::InsufficientResource`] is the only user-facing
//! rejection. Every other variant is an infrastructure failure that is
//! fatal to the single request but never to the process. The engine
//! never retries and never substitutes fallback values.

use clicker_db::DbError;

/// Failure of an engine command or query.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `convert` was issued while `resource == 0`. No mutation occurred.
    #[error("insufficient resource")]
    InsufficientResource,

    /// The store could not be read or written.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        /// The underlying store error.
        #[from]
        source: DbError,
    },

    /// Another writer committed between our read and our write.
    #[error("store write conflict: record moved past version {expected_version}")]
    StoreWriteConflict {
        /// Version the command read before computing its write.
        expected_version: u64,
    },

    /// The game-state record does not exist (bootstrap did not run).
    #[error("game state record is missing")]
    MissingRecord,

    /// A counter would exceed its representable range.
    #[error("counter overflow: {counter}")]
    CounterOverflow {
        /// Name of the counter that would overflow.
        counter: &'static str,
    },
}

impl EngineError {
    /// Whether this is an expected, client-visible rejection rather than
    /// an infrastructure failure.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::InsufficientResource)
    }
}
