//! Shared registry context handed to every command handler, rather than
//! reaching for hidden process-wide globals — keeps the whole registry
//! instantiable in isolation by a test harness.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rrcp_core::{Clock, RouteIndex, SessionTable, SystemClock};
use tokio_util::sync::CancellationToken;

use crate::events::EventBus;

/// Generic over the clock so tests can swap in [`rrcp_core::FakeClock`]
/// without threading a trait object through every handler (`Clock` isn't
/// object-safe: it requires `Clone`).
pub struct RegistryCtx<C: Clock = SystemClock> {
    pub sessions: SessionTable,
    pub index: ArcSwap<RouteIndex>,
    pub events: EventBus,
    pub clock: C,
    /// Cancelled once on `SIGINT`/`SIGTERM`; `listener::run` and
    /// `sweeper::run` both select on it to stop accepting new work.
    pub shutdown: CancellationToken,
}

impl RegistryCtx<SystemClock> {
    pub fn new() -> Arc<Self> {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> RegistryCtx<C> {
    pub fn with_clock(clock: C) -> Arc<Self> {
        Arc::new(Self {
            sessions: SessionTable::new(),
            index: ArcSwap::from_pointee(RouteIndex::default()),
            events: EventBus::new(),
            clock,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn publish_index(&self) {
        let index = crate::index::build(&self.sessions, self.index.load().generation + 1, self.clock.now());
        self.index.store(Arc::new(index));
    }
}
