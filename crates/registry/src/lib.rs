pub mod ctx;
pub mod dispatcher;
pub mod env;
pub mod events;
pub mod handlers;
pub mod index;
pub mod listener;
pub mod snapshot_http;
pub mod sweeper;
