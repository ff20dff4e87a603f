//! Verb dispatch: resolves the session a request names, applies the
//! per-command deadline, and routes to the matching handler.

use std::time::Duration;

use rrcp_core::{Clock, CoreError, ErrorKind};
use rrcp_wire::{Request, Response};

use crate::ctx::RegistryCtx;
use crate::events;
use crate::handlers::{config, operational, routes};

/// Dispatch one parsed request. `subscription` is the connection's current
/// event filter (set by `SUBSCRIBE`, cleared by `UNSUBSCRIBE`); `http_client`
/// backs `BACKEND_TEST`'s outbound probe.
pub async fn dispatch<C: Clock>(
    ctx: &RegistryCtx<C>,
    req: Request,
    subscription: &mut Option<events::Subscription>,
    http_client: &reqwest::Client,
    command_timeout: Duration,
    backend_test_timeout: Duration,
) -> Response {
    let outcome = tokio::time::timeout(command_timeout, dispatch_inner(ctx, req, subscription, http_client, backend_test_timeout)).await;
    match outcome {
        Ok(resp) => resp,
        Err(_) => Response::error(ErrorKind::Timeout, "command handler exceeded its deadline"),
    }
}

async fn dispatch_inner<C: Clock>(
    ctx: &RegistryCtx<C>,
    req: Request,
    subscription: &mut Option<events::Subscription>,
    http_client: &reqwest::Client,
    backend_test_timeout: Duration,
) -> Response {
    let now = ctx.clock.now();

    if let Request::Register { service, instance, maintenance_port, metadata } = req {
        let session = ctx.sessions.create(service, instance, maintenance_port, metadata, now, ctx.clock.epoch_ms() as u128);
        ctx.publish_index();
        return Response::Ack { session_id: session.id.clone() };
    }
    if let Request::Reconnect { session_id } = req {
        return match ctx.sessions.lookup(session_id.as_str()) {
            Some(session) => {
                session.mark_reconnected(now);
                Response::Ok
            }
            None => Response::error(ErrorKind::UnknownSession, "unknown session"),
        };
    }

    let Some(session_id) = req.session_id() else {
        return Response::error(ErrorKind::BadArguments, "verb requires a session id");
    };
    let Some(session) = ctx.sessions.lookup(session_id.as_str()) else {
        return Response::error(ErrorKind::UnknownSession, "unknown session");
    };
    session.touch_activity(now);

    let result: Result<Response, CoreError> = match req {
        Request::Ping { .. } => Ok(operational::ping()),
        Request::SessionInfo { .. } => Ok(operational::session_info(&session)),
        Request::ClientShutdown { .. } => Ok(operational::client_shutdown()),

        Request::RouteAdd { domains_csv, path, backend_url, priority, .. } => {
            let resp = routes::add(&session, &domains_csv, &path, &backend_url, priority, now);
            if let Ok(Response::RouteOk { route_id }) = &resp {
                ctx.events.publish(rrcp_core::LifecycleEvent::route_added(session.id.clone(), route_id.as_str().into()));
            }
            resp
        }
        Request::RouteAddBulk { routes_json, .. } => routes::add_bulk(&session, &routes_json, now),
        Request::RouteUpdate { route_id, fields_json, .. } => routes::update(&session, route_id.as_str(), &fields_json, now),
        Request::RouteRemove { route_id, .. } => routes::remove(&session, route_id.as_str(), now),
        Request::RouteList { .. } => Ok(routes::list(&session)),

        Request::HeadersSet { headers_json, .. } => config::headers_set(&session, &headers_json, now),
        Request::HeadersRemove { keys_csv, .. } => Ok(config::headers_remove(&session, &keys_csv, now)),
        Request::OptionsSet { options_json, .. } => config::options_set(&session, &options_json, now),
        Request::OptionsRemove { keys_csv, .. } => Ok(config::options_remove(&session, &keys_csv, now)),
        Request::HealthSet { route_id, spec_json, .. } => config::health_set(&session, route_id.as_str(), &spec_json, now),
        Request::RatelimitSet { route_id, spec_json, .. } => config::ratelimit_set(&session, route_id.as_str(), &spec_json, now),
        Request::CircuitBreakerSet { route_id, spec_json, .. } => {
            config::circuit_breaker_set(&session, route_id.as_str(), &spec_json, now)
        }
        Request::ConfigValidate { .. } => config::validate(&session),
        Request::ConfigApply { .. } => {
            let resp = config::apply(&session, now);
            if resp.is_ok() {
                ctx.publish_index();
                ctx.events.publish(rrcp_core::LifecycleEvent::config_applied(session.id.clone()));
            }
            resp
        }
        Request::ConfigRollback { .. } => Ok(config::rollback(&session, now)),
        Request::ConfigDiff { .. } => Ok(config::diff(&session)),
        Request::ConfigApplyPartial { scopes_csv, .. } => {
            let resp = config::apply_partial(&session, &scopes_csv, now);
            if resp.is_ok() {
                ctx.publish_index();
            }
            resp
        }

        Request::DrainStart { duration_secs, .. } => Ok(operational::drain_start(&session, duration_secs, now)),
        Request::DrainStatus { .. } => Ok(operational::drain_status(&session, now)),
        Request::DrainCancel { .. } => Ok(operational::drain_cancel(&session)),

        Request::MaintEnter { targets_csv, page_url, .. } => {
            let resp = operational::maint_enter(&session, &targets_csv, page_url);
            ctx.events.publish(rrcp_core::LifecycleEvent::maintenance_ok(session.id.clone(), targets_csv));
            Ok(resp)
        }
        Request::MaintExit { targets_csv, .. } => Ok(operational::maint_exit(&session, &targets_csv)),
        Request::MaintStatus { .. } => Ok(operational::maint_status(&session)),

        Request::CircuitBreakerStatus { route_id, .. } => operational::circuit_breaker_status(&session, route_id.as_str()),
        Request::CircuitBreakerReset { route_id, .. } => operational::circuit_breaker_reset(&session, route_id.as_str()),

        Request::StatsGet { .. } => Ok(operational::stats_get(&session)),
        Request::BackendTest { url, .. } => return operational::backend_test(http_client, &url, backend_test_timeout).await,

        Request::Subscribe { event_types_csv, .. } => {
            *subscription = Some(events::Subscription::parse(&event_types_csv));
            Ok(Response::SubscribeOk)
        }
        Request::Unsubscribe { .. } => {
            *subscription = None;
            Ok(Response::UnsubscribeOk)
        }

        Request::Register { .. } | Request::Reconnect { .. } => unreachable!("handled above"),
    };

    match result {
        Ok(resp) => resp,
        Err(err) => {
            let (kind, msg) = err.to_wire();
            Response::error(kind, msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rrcp_core::FakeClock;

    fn ctx() -> std::sync::Arc<RegistryCtx<FakeClock>> {
        RegistryCtx::with_clock(FakeClock::new())
    }

    #[tokio::test]
    async fn register_then_route_add_round_trips() {
        let ctx = ctx();
        let mut sub = None;
        let client = reqwest::Client::new();

        let resp = dispatch(
            &ctx,
            Request::Register { service: "svc".into(), instance: "i1".into(), maintenance_port: 3000, metadata: serde_json::json!({}) },
            &mut sub,
            &client,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;
        let Response::Ack { session_id } = resp else { panic!("expected ack") };

        let resp = dispatch(
            &ctx,
            Request::RouteAdd {
                session_id: session_id.clone(),
                domains_csv: "example.com".into(),
                path: "/api".into(),
                backend_url: "http://127.0.0.1:8080".into(),
                priority: 10,
            },
            &mut sub,
            &client,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(resp, Response::RouteOk { .. }));
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let ctx = ctx();
        let mut sub = None;
        let client = reqwest::Client::new();
        let resp = dispatch(
            &ctx,
            Request::Ping { session_id: "nope".into() },
            &mut sub,
            &client,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(resp, Response::Error { kind: ErrorKind::UnknownSession, .. }));
    }
}
