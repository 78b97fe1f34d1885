//! Clicker server binary.
//!
//! Wires the configured store, the state engine and the command router
//! together and serves until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `clicker-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Connect the configured store backend (running migrations for `PostgreSQL`)
//! 4. Bootstrap the game-state record; failure here is fatal
//! 5. Serve HTTP + `WebSocket` until shutdown
//! 6. Close the store

mod error;

use std::path::Path;
use std::sync::Arc;

use clicker_api::{AppState, ServerConfig};
use clicker_core::config::{ClickerConfig, DEFAULT_CONFIG_PATH, LoggingConfig, StoreConfig};
use clicker_core::{StateEngine, StoreBackend, SyncHub};
use clicker_db::{AnyStore, DragonflyStore, FileStore, MemoryStore, PostgresConfig, PostgresStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ServerBinError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server crashes.
#[tokio::main]
async fn main() -> Result<(), ServerBinError> {
    // 1. Load configuration.
    let config = ClickerConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        host = %config.server.host,
        port = config.server.port,
        backend = ?config.store.backend,
        "clicker-server starting"
    );

    // 3. Connect the store.
    let store = connect_store(&config.store).await?;
    info!(backend = ?config.store.backend, "Store connected");

    // 4. Bootstrap the record before serving anything.
    let engine = StateEngine::new(store);
    engine.bootstrap(config.game.initial_state()).await?;

    // 5. Serve.
    let state = Arc::new(AppState::new(
        SyncHub::new(engine),
        config.channels.outbox_capacity(),
    ));
    clicker_api::start_server(&ServerConfig::from(&config.server), Arc::clone(&state)).await?;

    // 6. Release store connections.
    state.hub.engine().store().close().await?;
    info!("clicker-server shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Build the store selected in configuration.
async fn connect_store(config: &StoreConfig) -> Result<AnyStore, ServerBinError> {
    let store = match config.backend {
        StoreBackend::Memory => AnyStore::from(MemoryStore::new()),
        StoreBackend::File => {
            info!(path = %config.file_path.display(), "Using file store");
            AnyStore::from(FileStore::new(&config.file_path))
        }
        StoreBackend::Postgres => {
            let pg_config = PostgresConfig::new(&config.postgres_url)
                .with_max_connections(config.max_connections);
            let store = PostgresStore::connect(&pg_config).await?;
            store.run_migrations().await?;
            AnyStore::from(store)
        }
        StoreBackend::Dragonfly => AnyStore::from(DragonflyStore::connect(&config.dragonfly_url).await?),
    };
    Ok(store)
}
