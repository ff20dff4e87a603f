//! TCP accept loop and per-connection command reader.
//!
//! One task per connection: read frames until EOF or a protocol-error
//! threshold is crossed, dispatch each to a [`Response`], and interleave
//! any `EVENT` frames the connection has subscribed to onto the same
//! write half (guarded by a mutex, since the dispatch loop and the event
//! forwarder both write to it).

use std::sync::Arc;
use std::time::Duration;

use rrcp_core::Clock;
use rrcp_wire::{read_frame, write_frame, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::ctx::RegistryCtx;
use crate::dispatcher::dispatch;
use crate::events::Subscription;

pub async fn run<C: Clock + 'static>(listener: TcpListener, ctx: Arc<RegistryCtx<C>>) {
    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => {
                info!("client listener shutting down");
                return;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(%addr, "accepted connection");
                    let ctx = Arc::clone(&ctx);
                    let _ = stream.set_nodelay(true);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        handle_connection(reader, writer, &ctx).await;
                    });
                }
                Err(e) => warn!(error = %e, "accept error"),
            },
        }
    }
}

async fn handle_connection<R, W, C>(reader: R, writer: W, ctx: &RegistryCtx<C>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    let mut reader = BufReader::new(reader);
    let writer = Arc::new(AsyncMutex::new(writer));
    let http_client = reqwest::Client::new();
    let command_timeout = crate::env::command_timeout();
    let backend_test_timeout = crate::env::backend_test_timeout();
    let protocol_error_threshold = crate::env::protocol_error_threshold();

    let mut subscription: Option<Subscription> = None;
    let mut event_forwarder: Option<tokio::task::JoinHandle<()>> = None;
    let mut protocol_errors = 0u32;
    let mut session_id: Option<String> = None;

    loop {
        let line = match read_frame(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "frame read error");
                break;
            }
        };

        let response = match Request::parse(&line) {
            Ok(req) => {
                let resp = dispatch(ctx, req, &mut subscription, &http_client, command_timeout, backend_test_timeout).await;
                if let Response::Ack { session_id: ref id } = resp {
                    session_id = Some(id.to_string());
                }
                protocol_errors = 0;
                resp
            }
            Err(e) => {
                protocol_errors += 1;
                warn!(error = %e, protocol_errors, "protocol error");
                Response::error(rrcp_core::ErrorKind::BadArguments, e.to_string())
            }
        };

        if matches!(response, Response::SubscribeOk) && event_forwarder.is_none() {
            if let Some(id) = &session_id {
                let sub = subscription.clone().unwrap_or_default();
                event_forwarder = Some(spawn_event_forwarder(ctx, id.clone(), sub, Arc::clone(&writer)));
            }
        }
        if matches!(response, Response::UnsubscribeOk) {
            if let Some(handle) = event_forwarder.take() {
                handle.abort();
            }
        }

        let frame = response.to_frame();
        let mut guard = writer.lock().await;
        if let Err(e) = write_frame(&mut *guard, &frame).await {
            warn!(error = %e, "frame write error");
            break;
        }
        drop(guard);

        if protocol_errors >= protocol_error_threshold {
            warn!("closing connection after repeated protocol errors");
            break;
        }
    }

    if let Some(handle) = event_forwarder.take() {
        handle.abort();
    }
    if let Some(id) = session_id {
        if let Some(session) = ctx.sessions.lookup(&id) {
            session.mark_disconnected(ctx.clock.now());
            info!(session_id = %id, "session disconnected, entering reconnect grace window");
        }
    }
}

fn spawn_event_forwarder<C, W>(
    ctx: &RegistryCtx<C>,
    session_id: String,
    subscription: Subscription,
    writer: Arc<AsyncMutex<W>>,
) -> tokio::task::JoinHandle<()>
where
    C: Clock + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut rx = ctx.events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.session_id.as_str() == session_id || event.session_id.as_str() == "*" => {
                    if !subscription.admits(&event) {
                        continue;
                    }
                    let frame = Response::Event { kind: event.kind.as_str().to_string(), payload: event.payload }.to_frame();
                    let mut guard = writer.lock().await;
                    if write_frame(&mut *guard, &frame).await.is_err() {
                        return;
                    }
                }
                Ok(_) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            }
        }
    })
}
