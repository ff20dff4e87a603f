//! Periodic poll of the registry's route-index snapshot endpoint.
//!
//! The dataplane and registry are separate processes with no shared
//! memory; this is the only way the dataplane learns about route changes.

use std::sync::Arc;
use std::time::Duration;

use rrcp_core::RouteIndex;
use tracing::{debug, warn};

use crate::ctx::DataplaneCtx;

pub async fn run(ctx: Arc<DataplaneCtx>, index_url: String, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    let snapshot_url = format!("{}/__rrcp/route-index", index_url.trim_end_matches('/'));
    loop {
        ticker.tick().await;
        match fetch_once(&ctx.http_client, &snapshot_url).await {
            Ok(index) => {
                let generation = index.generation;
                let known = index.known_route_ids();
                ctx.index.store(Arc::new(index));
                ctx.rate_limiter.retain_known(&known);
                ctx.circuit_breakers.retain_known(&known);
                debug!(generation, "route index refreshed");
            }
            Err(e) => warn!(error = %e, "failed to poll route index"),
        }
    }
}

async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<RouteIndex, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.json().await
}
