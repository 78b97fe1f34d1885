//! Error types for the storage layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`], [`fred`] and I/O errors with context about which operation
//! failed.

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A file-system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The record was expected to exist but did not.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A stored counter does not fit the in-memory representation.
    #[error("Value out of range for {field}: {value}")]
    OutOfRange {
        /// Name of the offending column or field.
        field: &'static str,
        /// Raw value read from the store.
        value: i128,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
