//! axum app wiring: every method/path falls through to the dispatch
//! decision, since routing is data-driven by the polled route index
//! rather than statically declared.

use std::sync::Arc;

use axum::routing::any;
use axum::Router;

use crate::ctx::DataplaneCtx;

pub fn router(ctx: Arc<DataplaneCtx>) -> Router {
    Router::new().fallback(any(crate::dispatch::handle)).with_state(ctx)
}
