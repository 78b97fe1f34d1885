//! Error types for the server binary.
//!
//! [`ServerBinError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerBinError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: clicker_core::ConfigError,
    },

    /// The store could not be reached or prepared.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: clicker_db::DbError,
    },

    /// The game-state record could not be bootstrapped.
    #[error("bootstrap error: {source}")]
    Bootstrap {
        /// The underlying engine error.
        #[from]
        source: clicker_core::EngineError,
    },

    /// The HTTP server failed to start or crashed.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: clicker_api::ServerError,
    },
}
