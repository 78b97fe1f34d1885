//! The state engine: sole writer of the game-state record.
//!
//! Every mutating command runs one read-modify-write against the store
//! while holding the command gate, a [`tokio::sync::Mutex`]. The guard
//! condition is evaluated on the very record that is about to be
//! replaced, and the write is a compare-and-swap on the record version,
//! so two concurrent `convert` calls can never both spend the last unit
//! of resource.
//!
//! A successful command returns [`Committed`], which carries the new
//! snapshot together with the gate permit. The next command cannot start
//! until the caller drops it, which is what lets the caller broadcast in
//! commit order without the engine knowing anything about observers.

use clicker_db::StateStore;
use clicker_types::{GameRecord, GameState};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// A mutating command accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Add one unit of resource. Always allowed.
    Produce,
    /// Spend one unit of resource for one unit of currency.
    Convert,
}

impl Command {
    /// Short name for log fields.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Produce => "produce",
            Self::Convert => "convert",
        }
    }

    /// Compute the successor of `state`, or reject without side effects.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientResource`] for `Convert` when
    /// `resource == 0`, and [`EngineError::CounterOverflow`] if a counter
    /// is already at its maximum.
    pub fn apply(self, state: GameState) -> Result<GameState, EngineError> {
        match self {
            Self::Produce => {
                let resource = state
                    .resource
                    .checked_add(1)
                    .ok_or(EngineError::CounterOverflow { counter: "resource" })?;
                Ok(GameState { resource, ..state })
            }
            Self::Convert => {
                let resource = state
                    .resource
                    .checked_sub(1)
                    .ok_or(EngineError::InsufficientResource)?;
                let currency = state
                    .currency
                    .checked_add(1)
                    .ok_or(EngineError::CounterOverflow { counter: "currency" })?;
                Ok(GameState { currency, resource })
            }
        }
    }
}

/// A committed snapshot that still holds the command gate.
///
/// No other command can commit while this value is alive. Drop it as
/// soon as the snapshot has been forwarded.
#[must_use = "dropping Committed releases the command gate"]
#[derive(Debug)]
pub struct Committed<'a> {
    state: GameState,
    version: u64,
    _permit: MutexGuard<'a, ()>,
}

impl Committed<'_> {
    /// The snapshot as of this commit.
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// Store version of the record holding this snapshot.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Release the gate and keep only the snapshot.
    pub fn into_state(self) -> GameState {
        self.state
    }
}

/// Owner of the invariants on the game state.
#[derive(Debug)]
pub struct StateEngine<S> {
    store: S,
    gate: Mutex<()>,
}

impl<S: StateStore> StateEngine<S> {
    /// Create an engine over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
        }
    }

    /// The injected store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create the record with `initial` counters if it does not exist.
    ///
    /// Must succeed before any request is served.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] if the store fails.
    pub async fn bootstrap(&self, initial: GameState) -> Result<GameRecord, EngineError> {
        let _permit = self.gate.lock().await;
        let record = self.store.create_if_absent(&GameRecord::new(initial)).await?;
        info!(
            backend = self.store.backend(),
            currency = record.state.currency,
            resource = record.state.resource,
            version = record.version,
            "Game state ready"
        );
        Ok(record)
    }

    /// Read the current snapshot. Never mutates.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StoreUnavailable`] or
    /// [`EngineError::MissingRecord`].
    pub async fn get_state(&self) -> Result<GameState, EngineError> {
        Ok(self.load().await?.state)
    }

    /// Add one unit of resource.
    ///
    /// # Errors
    ///
    /// Returns an infrastructure error if the store fails; production
    /// itself is never rejected.
    pub async fn produce(&self) -> Result<Committed<'_>, EngineError> {
        self.execute(Command::Produce).await
    }

    /// Spend one unit of resource for one unit of currency.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientResource`] when there is nothing
    /// to spend, or an infrastructure error if the store fails.
    pub async fn convert(&self) -> Result<Committed<'_>, EngineError> {
        self.execute(Command::Convert).await
    }

    /// Run `command` as one atomic read-modify-write.
    ///
    /// # Errors
    ///
    /// See [`Command::apply`]; also [`EngineError::StoreWriteConflict`]
    /// when the record changed underneath us, which only happens if
    /// something other than this engine writes to the store.
    pub async fn execute(&self, command: Command) -> Result<Committed<'_>, EngineError> {
        let permit = self.gate.lock().await;
        let current = self.load().await?;

        let state = command.apply(current.state).inspect_err(|e| {
            debug!(command = command.name(), error = %e, "Command rejected");
        })?;
        let next = current
            .next(state)
            .ok_or(EngineError::CounterOverflow { counter: "version" })?;

        if !self.store.compare_and_swap(current.version, &next).await? {
            warn!(
                command = command.name(),
                expected_version = current.version,
                "Store refused write, record changed concurrently"
            );
            return Err(EngineError::StoreWriteConflict {
                expected_version: current.version,
            });
        }

        debug!(
            command = command.name(),
            currency = state.currency,
            resource = state.resource,
            version = next.version,
            "Command committed"
        );

        Ok(Committed {
            state,
            version: next.version,
            _permit: permit,
        })
    }

    /// Read the current snapshot while holding the gate.
    ///
    /// Used when a new observer registers: no command can commit between
    /// this read and the moment the caller drops the result.
    ///
    /// # Errors
    ///
    /// Same as [`get_state`](Self::get_state).
    pub async fn pin(&self) -> Result<Committed<'_>, EngineError> {
        let permit = self.gate.lock().await;
        let current = self.load().await?;
        Ok(Committed {
            state: current.state,
            version: current.version,
            _permit: permit,
        })
    }

    async fn load(&self) -> Result<GameRecord, EngineError> {
        self.store.load().await?.ok_or(EngineError::MissingRecord)
    }
}
