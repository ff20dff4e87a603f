//! Periodic GC pass: resets abandoned staged views, retires sessions past
//! their reconnect grace window, recomputes circuit breakers so they can
//! half-open with no live traffic, and lets drains complete on their own
//! clock even without a client polling `DRAIN_STATUS`.

use std::sync::Arc;
use std::time::Duration;

use rrcp_core::{Clock, ConnectionState};
use tracing::info;

use crate::ctx::RegistryCtx;

pub async fn run<C: Clock + 'static>(ctx: Arc<RegistryCtx<C>>, interval: Duration, staging_ttl: Duration, reconnect_grace: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => return,
            _ = ticker.tick() => sweep_once(&ctx, staging_ttl, reconnect_grace),
        }
    }
}

fn sweep_once<C: Clock>(ctx: &RegistryCtx<C>, staging_ttl: Duration, reconnect_grace: Duration) {
    let now = ctx.clock.now();
    let mut retired = 0;

    for session in ctx.sessions.all() {
        if session.gc_stale_staging(now, staging_ttl) {
            info!(session_id = %session.id, "reset abandoned staged view");
        }
        session.recompute_all_breakers(now);
        session.drain_recompute(now);

        if let ConnectionState::Disconnected { since } = session.connection_state() {
            if now.saturating_duration_since(since) >= reconnect_grace {
                ctx.sessions.retire(session.id.as_str());
                retired += 1;
            }
        }
    }

    // The published route index carries time-varying decision state (drain
    // admission probability, drain completion, circuit admission) that
    // changes continuously and not only in response to a client verb — so
    // this tick republishes unconditionally, not just when a session was
    // retired, or the dataplane would never observe a drain completing or a
    // breaker half-opening on its own clock.
    ctx.publish_index();
    if retired > 0 {
        info!(retired, "retired sessions past their reconnect grace window");
    }
}
