use rrcp_registry::{ctx, env, listener, snapshot_http, sweeper};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(env::log_filter())).init();

    let ctx = ctx::RegistryCtx::new();

    let listen_port = env::listen_port();
    let tcp_listener = TcpListener::bind(("0.0.0.0", listen_port)).await.expect("failed to bind client listen port");
    tracing::info!(port = listen_port, "registry listening for client connections");

    let route_index_port = env::route_index_port();
    let snapshot_listener =
        TcpListener::bind(("127.0.0.1", route_index_port)).await.expect("failed to bind route-index snapshot port");
    let snapshot_app = snapshot_http::router(std::sync::Arc::clone(&ctx));
    tracing::info!(port = route_index_port, "serving internal route-index snapshot endpoint");

    let sweeper_ctx = std::sync::Arc::clone(&ctx);
    tokio::spawn(sweeper::run(sweeper_ctx, env::sweep_interval(), env::staging_ttl(), env::reconnect_grace()));

    let snapshot_shutdown = std::sync::Arc::clone(&ctx);
    tokio::spawn(async move {
        let serve = axum::serve(snapshot_listener, snapshot_app)
            .with_graceful_shutdown(async move { snapshot_shutdown.shutdown.cancelled().await });
        if let Err(e) = serve.await {
            tracing::error!(error = %e, "route-index snapshot server exited");
        }
    });

    let shutdown_ctx = std::sync::Arc::clone(&ctx);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received shutdown signal");
            shutdown_ctx.shutdown.cancel();
        }
    });

    listener::run(tcp_listener, ctx).await;
}
