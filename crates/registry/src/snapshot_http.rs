//! Internal HTTP endpoint the dataplane polls to learn the published route
//! index. Registry and dataplane are separate processes with no shared
//! memory, so the index crosses the process boundary as JSON over loopback.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use rrcp_core::{Clock, RouteIndex};

use crate::ctx::RegistryCtx;

pub fn router<C: Clock + 'static>(ctx: Arc<RegistryCtx<C>>) -> Router {
    Router::new().route("/__rrcp/route-index", get(get_index::<C>)).with_state(ctx)
}

async fn get_index<C: Clock + 'static>(State(ctx): State<Arc<RegistryCtx<C>>>) -> Json<RouteIndex> {
    Json((**ctx.index.load()).clone())
}
