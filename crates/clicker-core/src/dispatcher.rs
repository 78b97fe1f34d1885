//! Best-effort fan-out of snapshots to registered channels.
//!
//! Delivery never blocks on a slow observer: each `Open` channel gets a
//! non-blocking push into its bounded outbox. A channel that cannot take
//! the snapshot is closed and pruned in the same pass. Failures are
//! logged and swallowed so a broadcast can never fail the command that
//! produced it.

use std::sync::atomic::{AtomicU64, Ordering};

use clicker_types::GameState;
use tracing::debug;

use crate::registry::{ChannelState, ConnectionRegistry};

/// Outcome of one broadcast pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Channels that accepted the snapshot.
    pub delivered: usize,
    /// `Connecting` channels passed over; they get a fresh snapshot when
    /// their registration completes.
    pub skipped: usize,
    /// Channels removed from the registry during this pass.
    pub pruned: usize,
}

/// Pushes snapshots to every open channel in a [`ConnectionRegistry`].
#[derive(Debug, Default)]
pub struct Dispatcher {
    broadcasts: AtomicU64,
}

impl Dispatcher {
    /// Create a dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of broadcast passes run so far.
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }

    /// Deliver `snapshot` to every `Open` channel and prune dead ones.
    ///
    /// Order across channels is unspecified. Callers that need snapshots
    /// to arrive in commit order must not start the next commit before
    /// this returns.
    pub async fn broadcast(
        &self,
        registry: &ConnectionRegistry,
        snapshot: GameState,
    ) -> BroadcastReport {
        let mut channels = registry.lock().await;
        let mut report = BroadcastReport::default();
        let mut dead = Vec::new();

        for (id, channel) in channels.iter_mut() {
            match channel.state() {
                ChannelState::Open => match channel.deliver(snapshot) {
                    Ok(()) => report.delivered = report.delivered.saturating_add(1),
                    Err(e) => {
                        debug!(channel = %id, error = %e, "Dropping channel after failed send");
                        dead.push(*id);
                    }
                },
                ChannelState::Connecting => report.skipped = report.skipped.saturating_add(1),
                ChannelState::Closed => dead.push(*id),
            }
        }

        for id in &dead {
            channels.remove(id);
        }
        report.pruned = dead.len();
        drop(channels);

        self.broadcasts.fetch_add(1, Ordering::Relaxed);
        debug!(
            currency = snapshot.currency,
            resource = snapshot.resource,
            delivered = report.delivered,
            skipped = report.skipped,
            pruned = report.pruned,
            "Broadcast complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tokio::sync::mpsc;

    use super::*;

    #[tokio::test]
    async fn delivers_to_open_channels_only() {
        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new();

        let (open_tx, mut open_rx) = mpsc::channel(4);
        let open = registry.connect(open_tx).await;
        registry.open(open, GameState::INITIAL).await.unwrap();
        let _ = open_rx.recv().await;

        let (pending_tx, mut pending_rx) = mpsc::channel(4);
        let _pending = registry.connect(pending_tx).await;

        let report = dispatcher.broadcast(&registry, GameState::new(1, 1)).await;
        assert_eq!(
            report,
            BroadcastReport {
                delivered: 1,
                skipped: 1,
                pruned: 0
            }
        );
        assert_eq!(open_rx.recv().await, Some(GameState::new(1, 1)));
        assert!(pending_rx.try_recv().is_err());
        assert_eq!(dispatcher.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn prunes_closed_and_failed_channels() {
        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new();

        let (gone_tx, gone_rx) = mpsc::channel(4);
        let gone = registry.connect(gone_tx).await;
        registry.open(gone, GameState::INITIAL).await.unwrap();
        drop(gone_rx);

        let (closed_tx, _closed_rx) = mpsc::channel(4);
        let closed = registry.connect(closed_tx).await;
        registry.open(closed, GameState::INITIAL).await.unwrap();
        registry.close(closed).await;

        let (live_tx, mut live_rx) = mpsc::channel(4);
        let live = registry.connect(live_tx).await;
        registry.open(live, GameState::INITIAL).await.unwrap();

        let report = dispatcher.broadcast(&registry, GameState::new(1, 1)).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.pruned, 2);
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.state_of(live).await, Some(ChannelState::Open));

        assert_eq!(live_rx.recv().await, Some(GameState::INITIAL));
        assert_eq!(live_rx.recv().await, Some(GameState::new(1, 1)));
    }

    #[tokio::test]
    async fn slow_observer_is_dropped_not_waited_for() {
        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new();

        let (tx, _rx) = mpsc::channel(1);
        let id = registry.connect(tx).await;
        registry.open(id, GameState::INITIAL).await.unwrap();

        // Outbox still holds the registration snapshot.
        let report = dispatcher.broadcast(&registry, GameState::new(1, 1)).await;
        assert_eq!(report.pruned, 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn empty_registry_is_fine() {
        let registry = ConnectionRegistry::new();
        let dispatcher = Dispatcher::new();
        let report = dispatcher.broadcast(&registry, GameState::INITIAL).await;
        assert_eq!(report, BroadcastReport::default());
    }
}
