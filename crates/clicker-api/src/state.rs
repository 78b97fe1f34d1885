//! Shared application state for the router.

use std::sync::Arc;

use clicker_core::SyncHub;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug)]
pub struct AppState<S> {
    /// Engine plus observer fan-out.
    pub hub: Arc<SyncHub<S>>,
    /// Outbox size for each new observer channel.
    pub channel_capacity: usize,
}

impl<S> AppState<S> {
    /// Create application state around `hub`.
    ///
    /// `channel_capacity` is clamped to at least 1.
    pub fn new(hub: SyncHub<S>, channel_capacity: usize) -> Self {
        Self {
            hub: Arc::new(hub),
            channel_capacity: channel_capacity.max(1),
        }
    }
}
