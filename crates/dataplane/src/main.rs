use std::net::SocketAddr;

use rrcp_dataplane::{ctx, env, poller, server};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(env::log_filter())).init();

    let http_client = reqwest::Client::builder().build().expect("failed to build HTTP client");
    let ctx = ctx::DataplaneCtx::new(http_client);

    let index_url = env::registry_index_url();
    let poll_interval = env::index_poll_interval();
    tokio::spawn(poller::run(std::sync::Arc::clone(&ctx), index_url, poll_interval));

    let listen_port = env::listen_port();
    let listener = TcpListener::bind(("0.0.0.0", listen_port)).await.expect("failed to bind dataplane listen port");
    tracing::info!(port = listen_port, "dataplane listening for HTTP requests");

    let app = server::router(ctx);
    let serve = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());
    serve.await.expect("dataplane server exited");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("received shutdown signal");
    }
}
