//! Registry of live observer channels.
//!
//! A [`Channel`] is an opaque handle to one connected observer: a bounded
//! outbox of snapshots plus an explicit lifecycle.
//!
//! ```text
//! Connecting ──open──▶ Open ──close / send failure──▶ Closed
//!      │                                                ▲
//!      └──────────────────── close ─────────────────────┘
//! ```
//!
//! `Closed` is terminal. Only `Open` channels receive broadcasts. The
//! registry holds no game data; it is a fan-out list keyed by
//! [`ChannelId`].

use std::collections::BTreeMap;

use clicker_types::{ChannelId, GameState};
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;

/// Lifecycle state of an observer channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Registered but the initial snapshot has not been pushed yet.
    Connecting,
    /// Eligible for delivery.
    Open,
    /// Terminal. The observer must reconnect to get a new channel.
    Closed,
}

/// A lifecycle transition that is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid channel transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    /// State the channel was in.
    pub from: ChannelState,
    /// State that was requested.
    pub to: ChannelState,
}

/// Why a snapshot could not be handed to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelSendFailure {
    /// The channel is not in the `Open` state.
    #[error("channel {id} is not open ({state:?})")]
    NotOpen {
        /// The channel.
        id: ChannelId,
        /// Its current state.
        state: ChannelState,
    },

    /// The observer is not draining its outbox fast enough.
    #[error("channel {id} outbox is full")]
    Full {
        /// The channel.
        id: ChannelId,
    },

    /// The transport side has gone away.
    #[error("channel {id} transport is gone")]
    Disconnected {
        /// The channel.
        id: ChannelId,
    },
}

/// One connected observer.
#[derive(Debug)]
pub struct Channel {
    id: ChannelId,
    state: ChannelState,
    outbox: Sender<GameState>,
    delivered: u64,
}

impl Channel {
    /// Create a `Connecting` channel feeding `outbox`.
    pub fn new(outbox: Sender<GameState>) -> Self {
        Self {
            id: ChannelId::new(),
            state: ChannelState::Connecting,
            outbox,
            delivered: 0,
        }
    }

    /// Identifier of this channel.
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ChannelState {
        self.state
    }

    /// Number of snapshots handed to the outbox so far.
    pub const fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Move to `to` if the lifecycle allows it.
    ///
    /// Closing an already closed channel is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] for any edge not in the lifecycle
    /// diagram, notably any attempt to leave `Closed`.
    pub fn transition(&mut self, to: ChannelState) -> Result<(), InvalidTransition> {
        match (self.state, to) {
            (ChannelState::Connecting, ChannelState::Open)
            | (_, ChannelState::Closed) => {
                self.state = to;
                Ok(())
            }
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }

    /// Push the registration snapshot and open the channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelSendFailure`] (and closes the channel) if the
    /// snapshot cannot be queued, or `NotOpen` if the channel is not
    /// `Connecting`.
    pub fn open_with(&mut self, snapshot: GameState) -> Result<(), ChannelSendFailure> {
        if self.state != ChannelState::Connecting {
            return Err(ChannelSendFailure::NotOpen {
                id: self.id,
                state: self.state,
            });
        }
        self.push(snapshot)?;
        self.state = ChannelState::Open;
        Ok(())
    }

    /// Hand `snapshot` to an `Open` channel without waiting.
    ///
    /// # Errors
    ///
    /// Returns `NotOpen` for a channel in any other state. A full or
    /// disconnected outbox closes the channel and returns the reason.
    pub fn deliver(&mut self, snapshot: GameState) -> Result<(), ChannelSendFailure> {
        if self.state != ChannelState::Open {
            return Err(ChannelSendFailure::NotOpen {
                id: self.id,
                state: self.state,
            });
        }
        self.push(snapshot)
    }

    fn push(&mut self, snapshot: GameState) -> Result<(), ChannelSendFailure> {
        match self.outbox.try_send(snapshot) {
            Ok(()) => {
                self.delivered = self.delivered.saturating_add(1);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.state = ChannelState::Closed;
                Err(ChannelSendFailure::Full { id: self.id })
            }
            Err(TrySendError::Closed(_)) => {
                self.state = ChannelState::Closed;
                Err(ChannelSendFailure::Disconnected { id: self.id })
            }
        }
    }
}

/// Set of currently registered observer channels.
///
/// Safe for concurrent use: connect and disconnect events come from
/// `WebSocket` tasks while the dispatcher prunes during broadcasts.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    channels: RwLock<BTreeMap<ChannelId, Channel>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `Connecting` channel for `outbox` and return its id.
    pub async fn connect(&self, outbox: Sender<GameState>) -> ChannelId {
        let channel = Channel::new(outbox);
        let id = channel.id();
        self.channels.write().await.insert(id, channel);
        id
    }

    /// Push the registration snapshot to `id` and mark it `Open`.
    ///
    /// A channel that cannot take the snapshot is removed.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelSendFailure::Disconnected`] if `id` is unknown,
    /// otherwise whatever [`Channel::open_with`] reports.
    pub async fn open(&self, id: ChannelId, snapshot: GameState) -> Result<(), ChannelSendFailure> {
        let mut channels = self.channels.write().await;
        let channel = channels
            .get_mut(&id)
            .ok_or(ChannelSendFailure::Disconnected { id })?;

        let result = channel.open_with(snapshot);
        if result.is_err() {
            channels.remove(&id);
        }
        result
    }

    /// Mark `id` as `Closed`. It is dropped on the next broadcast.
    ///
    /// Returns `false` if the channel is not registered.
    pub async fn close(&self, id: ChannelId) -> bool {
        let mut channels = self.channels.write().await;
        channels
            .get_mut(&id)
            .is_some_and(|channel| channel.transition(ChannelState::Closed).is_ok())
    }

    /// Remove `id`. Idempotent; returns whether it was present.
    pub async fn unregister(&self, id: ChannelId) -> bool {
        let removed = self.channels.write().await.remove(&id).is_some();
        if removed {
            debug!(channel = %id, "Channel unregistered");
        }
        removed
    }

    /// Ids of all registered channels, in any state.
    pub async fn ids(&self) -> Vec<ChannelId> {
        self.channels.read().await.keys().copied().collect()
    }

    /// Lifecycle state of `id`, if registered.
    pub async fn state_of(&self, id: ChannelId) -> Option<ChannelState> {
        self.channels.read().await.get(&id).map(Channel::state)
    }

    /// Number of registered channels in any state.
    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Whether no channel is registered.
    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Number of channels eligible for delivery.
    pub async fn open_count(&self) -> usize {
        self.channels
            .read()
            .await
            .values()
            .filter(|c| c.state() == ChannelState::Open)
            .count()
    }

    /// Exclusive access for the dispatcher's deliver-and-prune pass.
    pub(crate) async fn lock(&self) -> RwLockWriteGuard<'_, BTreeMap<ChannelId, Channel>> {
        self.channels.write().await
    }
}
