//! The command/query facade the router calls into.
//!
//! [`SyncHub`] owns one [`StateEngine`], one [`ConnectionRegistry`] and
//! one [`Dispatcher`], and wires them so that every accepted mutation is
//! broadcast exactly once, before the next mutation may commit.

use clicker_db::StateStore;
use clicker_types::{ChannelId, GameState};
use tokio::sync::mpsc::Sender;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::engine::{Command, StateEngine};
use crate::error::EngineError;
use crate::registry::ConnectionRegistry;

/// State engine plus observer fan-out.
#[derive(Debug)]
pub struct SyncHub<S> {
    engine: StateEngine<S>,
    registry: ConnectionRegistry,
    dispatcher: Dispatcher,
}

impl<S: StateStore> SyncHub<S> {
    /// Wrap a bootstrapped engine with an empty registry.
    pub fn new(engine: StateEngine<S>) -> Self {
        Self {
            engine,
            registry: ConnectionRegistry::new(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// The underlying engine.
    pub const fn engine(&self) -> &StateEngine<S> {
        &self.engine
    }

    /// The observer registry.
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The broadcast dispatcher.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current snapshot.
    ///
    /// # Errors
    ///
    /// See [`StateEngine::get_state`].
    pub async fn get_state(&self) -> Result<GameState, EngineError> {
        self.engine.get_state().await
    }

    /// Produce one resource and broadcast the result.
    ///
    /// # Errors
    ///
    /// See [`StateEngine::produce`].
    pub async fn produce(&self) -> Result<GameState, EngineError> {
        self.execute(Command::Produce).await
    }

    /// Convert one resource into currency and broadcast the result.
    ///
    /// A rejected conversion broadcasts nothing.
    ///
    /// # Errors
    ///
    /// See [`StateEngine::convert`].
    pub async fn convert(&self) -> Result<GameState, EngineError> {
        self.execute(Command::Convert).await
    }

    /// Run `command`, then broadcast the committed snapshot while the
    /// command gate is still held.
    ///
    /// # Errors
    ///
    /// Returns the engine error unchanged; broadcast failures are never
    /// reported here.
    pub async fn execute(&self, command: Command) -> Result<GameState, EngineError> {
        let committed = self.engine.execute(command).await?;
        self.dispatcher
            .broadcast(&self.registry, committed.state())
            .await;
        Ok(committed.into_state())
    }

    /// Register an observer and push it the current snapshot.
    ///
    /// The snapshot is read under the command gate and queued before the
    /// channel becomes visible to broadcasts, so the observer sees the
    /// current truth first and every later commit after it.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the current state cannot be read; the
    /// channel is not registered in that case.
    pub async fn register(&self, outbox: Sender<GameState>) -> Result<ChannelId, EngineError> {
        let pinned = self.engine.pin().await?;
        let id = self.registry.connect(outbox).await;

        if let Err(e) = self.registry.open(id, pinned.state()).await {
            debug!(channel = %id, error = %e, "Channel dropped during registration");
        } else {
            info!(
                channel = %id,
                currency = pinned.state().currency,
                resource = pinned.state().resource,
                "Channel registered"
            );
        }
        drop(pinned);

        Ok(id)
    }

    /// Remove an observer. Safe to call more than once.
    pub async fn unregister(&self, id: ChannelId) -> bool {
        let removed = self.registry.unregister(id).await;
        if removed {
            info!(channel = %id, "Channel disconnected");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clicker_db::MemoryStore;
    use tokio::sync::mpsc;

    use super::*;

    async fn hub_with(state: GameState) -> SyncHub<MemoryStore> {
        let engine = StateEngine::new(MemoryStore::new());
        engine.bootstrap(state).await.unwrap();
        SyncHub::new(engine)
    }

    #[tokio::test]
    async fn registration_pushes_current_truth() {
        let hub = hub_with(GameState::new(5, 2)).await;
        let (tx, mut rx) = mpsc::channel(8);

        hub.register(tx).await.unwrap();
        assert_eq!(rx.recv().await, Some(GameState::new(5, 2)));
        assert_eq!(hub.dispatcher().broadcast_count(), 0);
    }

    #[tokio::test]
    async fn rejected_convert_broadcasts_nothing() {
        let hub = hub_with(GameState::new(2, 0)).await;
        let (tx, mut rx) = mpsc::channel(8);
        hub.register(tx).await.unwrap();
        let _ = rx.recv().await;

        assert!(matches!(
            hub.convert().await,
            Err(EngineError::InsufficientResource)
        ));
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.dispatcher().broadcast_count(), 0);
    }

    #[tokio::test]
    async fn unregister_twice_is_harmless() {
        let hub = hub_with(GameState::INITIAL).await;
        let (tx, _rx) = mpsc::channel(8);
        let id = hub.register(tx).await.unwrap();

        assert!(hub.unregister(id).await);
        assert!(!hub.unregister(id).await);
        assert!(hub.registry().is_empty().await);
    }
}
