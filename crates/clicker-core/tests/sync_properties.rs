//! Property tests for the state-synchronization engine.
//!
//! These run the engine, registry and dispatcher together through
//! [`SyncHub`] on a multi-threaded runtime, without any networking.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use clicker_core::{EngineError, StateEngine, SyncHub};
use clicker_db::MemoryStore;
use clicker_types::GameState;
use tokio::sync::mpsc;

async fn hub_with(state: GameState) -> Arc<SyncHub<MemoryStore>> {
    let engine = StateEngine::new(MemoryStore::new());
    engine.bootstrap(state).await.unwrap();
    Arc::new(SyncHub::new(engine))
}

/// Drain everything currently queued for one observer.
fn drain(rx: &mut mpsc::Receiver<GameState>) -> Vec<GameState> {
    let mut seen = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        seen.push(snapshot);
    }
    seen
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_converts_never_overspend() {
    const RESOURCE: u64 = 7;
    const CALLERS: u64 = 40;

    let hub = hub_with(GameState::new(1, RESOURCE)).await;

    let mut handles = Vec::new();
    for _ in 0..CALLERS {
        let hub = Arc::clone(&hub);
        handles.push(tokio::spawn(async move { hub.convert().await }));
    }

    let mut successes = 0_u64;
    let mut rejections = 0_u64;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::InsufficientResource) => rejections += 1,
            Err(other) => panic!("unexpected engine error: {other}"),
        }
    }

    assert_eq!(successes, RESOURCE);
    assert_eq!(rejections, CALLERS - RESOURCE);
    assert_eq!(
        hub.get_state().await.unwrap(),
        GameState::new(1 + RESOURCE, 0)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn every_observer_sees_commits_in_the_same_order() {
    const COMMANDS: u64 = 50;

    let hub = hub_with(GameState::INITIAL).await;

    let mut observers = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::channel(256);
        hub.register(tx).await.unwrap();
        observers.push(rx);
    }

    let mut handles = Vec::new();
    for i in 0..COMMANDS {
        let hub = Arc::clone(&hub);
        handles.push(tokio::spawn(async move {
            if i % 3 == 0 {
                let _ = hub.convert().await;
            } else {
                hub.produce().await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let final_state = hub.get_state().await.unwrap();
    let expected_broadcasts = hub.dispatcher().broadcast_count();

    let mut sequences = Vec::new();
    for rx in &mut observers {
        let seen = drain(rx);
        // Registration snapshot plus one message per accepted command.
        assert_eq!(seen.len() as u64, expected_broadcasts + 1);
        assert_eq!(seen.last().copied(), Some(final_state));

        // Each accepted command moves exactly one unit, so the total
        // (currency + resource) grows by 1 per produce and stays flat per
        // convert; consecutive snapshots must differ by exactly one step.
        for pair in seen.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let produced = b.resource == a.resource + 1 && b.currency == a.currency;
            let converted = b.resource + 1 == a.resource && b.currency == a.currency + 1;
            assert!(produced || converted, "out-of-order step {a:?} -> {b:?}");
        }
        sequences.push(seen);
    }

    assert_eq!(sequences[0], sequences[1]);
    assert_eq!(sequences[1], sequences[2]);
}

#[tokio::test]
async fn late_observer_gets_current_state_without_a_mutation() {
    let hub = hub_with(GameState::INITIAL).await;
    for _ in 0..6 {
        hub.produce().await.unwrap();
    }
    for _ in 0..4 {
        hub.convert().await.unwrap();
    }
    assert_eq!(hub.get_state().await.unwrap(), GameState::new(5, 2));

    let (tx, mut rx) = mpsc::channel(8);
    hub.register(tx).await.unwrap();
    assert_eq!(rx.recv().await, Some(GameState::new(5, 2)));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn click_session_end_to_end() {
    let hub = hub_with(GameState::INITIAL).await;
    let (tx, mut rx) = mpsc::channel(8);
    hub.register(tx).await.unwrap();
    assert_eq!(rx.recv().await, Some(GameState::new(1, 0)));

    assert_eq!(hub.produce().await.unwrap(), GameState::new(1, 1));
    assert_eq!(rx.recv().await, Some(GameState::new(1, 1)));

    assert_eq!(hub.convert().await.unwrap(), GameState::new(2, 0));
    assert_eq!(rx.recv().await, Some(GameState::new(2, 0)));

    assert!(matches!(
        hub.convert().await,
        Err(EngineError::InsufficientResource)
    ));
    assert!(rx.try_recv().is_err());
    assert_eq!(hub.get_state().await.unwrap(), GameState::new(2, 0));
    assert_eq!(hub.dispatcher().broadcast_count(), 2);
}

#[tokio::test]
async fn disconnected_observer_does_not_fail_commands() {
    let hub = hub_with(GameState::INITIAL).await;

    let (gone_tx, gone_rx) = mpsc::channel(8);
    hub.register(gone_tx).await.unwrap();
    drop(gone_rx);

    let (tx, mut rx) = mpsc::channel(8);
    hub.register(tx).await.unwrap();
    let _ = rx.recv().await;

    assert_eq!(hub.produce().await.unwrap(), GameState::new(1, 1));
    assert_eq!(rx.recv().await, Some(GameState::new(1, 1)));
    assert_eq!(hub.registry().len().await, 1);
}
