//! Sessions and the session table.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::bundle::{ConfigBundle, ConfigDiff};
use crate::circuit::CircuitBreaker;
use crate::drain::{DrainState, DrainStatus};
use crate::error::CoreError;
use crate::id::{RouteId, SessionId};
use crate::maintenance::MaintenanceSet;
use crate::metrics::{RouteCounters, RouteStats};
use crate::route::Route;

/// Named scopes `CONFIG_APPLY_PARTIAL` can commit independently. Only these
/// three are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyScope {
    Routes,
    Headers,
    Options,
}

impl ApplyScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "routes" => Some(ApplyScope::Routes),
            "headers" => Some(ApplyScope::Headers),
            "options" => Some(ApplyScope::Options),
            _ => None,
        }
    }
}

/// Whether a session's TCP connection is live, or within the reconnect
/// grace window after an abrupt disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected { since: Instant },
}

struct ConfigPair {
    active: ConfigBundle,
    staged: ConfigBundle,
}

/// One registered service's isolated state: its active/staged configuration,
/// drain/maintenance/circuit-breaker state, and bookkeeping.
pub struct Session {
    pub id: SessionId,
    pub service: String,
    pub instance: String,
    pub maintenance_port: u16,
    pub metadata: Value,
    pub created_at: Instant,

    config: RwLock<ConfigPair>,
    route_counter: AtomicU64,
    drain: Mutex<DrainState>,
    maintenance: Mutex<MaintenanceSet>,
    breakers: Mutex<HashMap<RouteId, CircuitBreaker>>,
    counters: Mutex<HashMap<RouteId, RouteCounters>>,
    last_activity: Mutex<Instant>,
    last_staged_touch: Mutex<Instant>,
    connection: Mutex<ConnectionState>,
}

impl Session {
    pub fn new(id: SessionId, service: String, instance: String, maintenance_port: u16, metadata: Value, now: Instant) -> Self {
        Self {
            id,
            service,
            instance,
            maintenance_port,
            metadata,
            created_at: now,
            config: RwLock::new(ConfigPair { active: ConfigBundle::default(), staged: ConfigBundle::default() }),
            route_counter: AtomicU64::new(0),
            drain: Mutex::new(DrainState::default()),
            maintenance: Mutex::new(MaintenanceSet::default()),
            breakers: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            last_activity: Mutex::new(now),
            last_staged_touch: Mutex::new(now),
            connection: Mutex::new(ConnectionState::Connected),
        }
    }

    pub fn touch_activity(&self, now: Instant) {
        *self.last_activity.lock() = now;
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.lock()
    }

    pub fn mark_disconnected(&self, now: Instant) {
        *self.connection.lock() = ConnectionState::Disconnected { since: now };
    }

    pub fn mark_reconnected(&self, now: Instant) {
        *self.connection.lock() = ConnectionState::Connected;
        self.touch_activity(now);
    }

    // -- staging store (C3) --------------------------------------------

    /// Issue the next route ID for this session (`ROUTE_ADD`/`ROUTE_ADD_BULK`
    /// only). Monotonic, never reused.
    pub fn next_route_id(&self) -> RouteId {
        let n = self.route_counter.fetch_add(1, Ordering::SeqCst) + 1;
        RouteId::from_counter(n)
    }

    pub fn stage_add_route(&self, route: Route, now: Instant) {
        let mut cfg = self.config.write();
        cfg.staged.routes.insert(route.id.clone(), route);
        drop(cfg);
        self.touch_staging(now);
    }

    pub fn stage_update_route(&self, route_id: &RouteId, route: Route, now: Instant) -> Result<(), CoreError> {
        let mut cfg = self.config.write();
        if !cfg.staged.routes.contains_key(route_id) {
            return Err(CoreError::RouteNotFound(route_id.to_string()));
        }
        cfg.staged.routes.insert(route_id.clone(), route);
        drop(cfg);
        self.touch_staging(now);
        Ok(())
    }

    pub fn stage_remove_route(&self, route_id: &RouteId, now: Instant) -> Result<(), CoreError> {
        let mut cfg = self.config.write();
        if !cfg.staged.routes.contains_key(route_id) {
            return Err(CoreError::RouteNotFound(route_id.to_string()));
        }
        cfg.staged.removed.insert(route_id.clone());
        drop(cfg);
        self.touch_staging(now);
        Ok(())
    }

    pub fn stage_headers_set(&self, headers: HashMap<String, String>, now: Instant) {
        let mut cfg = self.config.write();
        cfg.staged.headers.extend(headers);
        drop(cfg);
        self.touch_staging(now);
    }

    pub fn stage_headers_remove(&self, keys: &[String], now: Instant) {
        let mut cfg = self.config.write();
        for k in keys {
            cfg.staged.headers.remove(k);
        }
        drop(cfg);
        self.touch_staging(now);
    }

    pub fn stage_options_set(&self, options: HashMap<String, String>, now: Instant) {
        let mut cfg = self.config.write();
        cfg.staged.options.extend(options);
        drop(cfg);
        self.touch_staging(now);
    }

    pub fn stage_options_remove(&self, keys: &[String], now: Instant) {
        let mut cfg = self.config.write();
        for k in keys {
            cfg.staged.options.remove(k);
        }
        drop(cfg);
        self.touch_staging(now);
    }

    /// Attach (or clear) a per-route health/rate-limit/circuit-breaker spec
    /// by mutating the staged route in place. Returns `route_not_found` if
    /// the route isn't in the staged view.
    pub fn stage_mutate_route<F>(&self, route_id: &RouteId, now: Instant, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Route),
    {
        let mut cfg = self.config.write();
        let route = cfg.staged.routes.get_mut(route_id).ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()))?;
        f(route);
        drop(cfg);
        self.touch_staging(now);
        Ok(())
    }

    pub fn validate_staged(&self) -> Result<(), CoreError> {
        let cfg = self.config.read();
        cfg.staged.validate().map_err(CoreError::ValidationFailed)
    }

    /// `CONFIG_APPLY`: validate, then atomically swap staged into active and
    /// reset staged to a fresh copy of the new active.
    pub fn apply(&self, now: Instant) -> Result<(), CoreError> {
        let mut cfg = self.config.write();
        cfg.staged.validate().map_err(CoreError::ValidationFailed)?;
        let new_active = ConfigBundle {
            routes: cfg.staged.resolved_routes(),
            headers: cfg.staged.headers.clone(),
            options: cfg.staged.options.clone(),
            removed: Default::default(),
        };
        cfg.active = new_active;
        cfg.staged = cfg.active.clone_as_staged_base();
        drop(cfg);
        *self.last_staged_touch.lock() = now;
        Ok(())
    }

    /// `CONFIG_APPLY_PARTIAL`: commit only the named scopes.
    pub fn apply_partial(&self, scopes: &[ApplyScope], now: Instant) -> Result<(), CoreError> {
        let mut cfg = self.config.write();
        cfg.staged.validate().map_err(CoreError::ValidationFailed)?;
        for scope in scopes {
            match scope {
                ApplyScope::Routes => {
                    cfg.active.routes = cfg.staged.resolved_routes();
                }
                ApplyScope::Headers => {
                    cfg.active.headers = cfg.staged.headers.clone();
                }
                ApplyScope::Options => {
                    cfg.active.options = cfg.staged.options.clone();
                }
            }
        }
        drop(cfg);
        *self.last_staged_touch.lock() = now;
        Ok(())
    }

    /// `CONFIG_ROLLBACK`: discard staged, replace with a fresh copy of active.
    pub fn rollback(&self, now: Instant) {
        let mut cfg = self.config.write();
        cfg.staged = cfg.active.clone_as_staged_base();
        drop(cfg);
        *self.last_staged_touch.lock() = now;
    }

    pub fn diff(&self) -> ConfigDiff {
        let cfg = self.config.read();
        ConfigDiff::compute(&cfg.active, &cfg.staged)
    }

    pub fn active_routes(&self) -> HashMap<RouteId, Route> {
        self.config.read().active.routes.clone()
    }

    pub fn staged_view(&self) -> ConfigBundle {
        self.config.read().staged.clone()
    }

    pub fn active_view(&self) -> ConfigBundle {
        self.config.read().active.clone()
    }

    /// GC a staged view that hasn't been touched within `ttl`: reset it to
    /// match active. Returns `true` if anything was discarded.
    pub fn gc_stale_staging(&self, now: Instant, ttl: std::time::Duration) -> bool {
        let last_touch = *self.last_staged_touch.lock();
        if now.saturating_duration_since(last_touch) < ttl {
            return false;
        }
        let mut cfg = self.config.write();
        let stale = !ConfigDiff::compute(&cfg.active, &cfg.staged).is_empty();
        if stale {
            cfg.staged = cfg.active.clone_as_staged_base();
        }
        drop(cfg);
        *self.last_staged_touch.lock() = now;
        stale
    }

    fn touch_staging(&self, now: Instant) {
        *self.last_staged_touch.lock() = now;
    }

    // -- drain / maintenance / circuit breaker (C6) ---------------------

    pub fn drain_start(&self, now: Instant, duration: std::time::Duration) {
        self.drain.lock().start(now, duration);
    }

    pub fn drain_cancel(&self) {
        self.drain.lock().cancel();
    }

    pub fn drain_status(&self, now: Instant) -> DrainStatus {
        let mut drain = self.drain.lock();
        drain.recompute(now);
        drain.status(now)
    }

    pub fn drain_recompute(&self, now: Instant) {
        self.drain.lock().recompute(now);
    }

    pub fn is_drain_completed(&self, now: Instant) -> bool {
        let mut drain = self.drain.lock();
        drain.recompute(now);
        drain.phase == crate::drain::DrainPhase::Completed
    }

    pub fn drain_admission_probability(&self, now: Instant) -> f64 {
        let mut drain = self.drain.lock();
        drain.recompute(now);
        drain.admission_probability(now)
    }

    pub fn maintenance_enter(&self, targets: &[RouteId], page_url: Option<String>) {
        self.maintenance.lock().enter(targets, page_url);
    }

    pub fn maintenance_exit(&self, targets: &[RouteId]) {
        self.maintenance.lock().exit(targets);
    }

    pub fn maintenance_snapshot(&self) -> MaintenanceSet {
        self.maintenance.lock().clone()
    }

    pub fn is_in_maintenance(&self, route_id: &RouteId) -> bool {
        self.maintenance.lock().covers(route_id)
    }

    pub fn circuit_breaker_set(&self, route_id: &RouteId, spec: crate::route::CircuitBreakerSpec) {
        self.breakers.lock().insert(route_id.clone(), CircuitBreaker::new(spec));
    }

    pub fn circuit_breaker_reset(&self, route_id: &RouteId) -> Result<(), CoreError> {
        let mut breakers = self.breakers.lock();
        let cb = breakers.get_mut(route_id).ok_or_else(|| CoreError::RouteNotFound(route_id.to_string()))?;
        cb.reset();
        Ok(())
    }

    pub fn circuit_should_admit(&self, route_id: &RouteId, now: Instant) -> bool {
        let mut breakers = self.breakers.lock();
        match breakers.get_mut(route_id) {
            Some(cb) => cb.should_admit(now),
            None => true,
        }
    }

    pub fn circuit_record_result(&self, route_id: &RouteId, now: Instant, success: bool) {
        if let Some(cb) = self.breakers.lock().get_mut(route_id) {
            cb.record_result(now, success);
        }
    }

    pub fn circuit_state(&self, route_id: &RouteId) -> Option<crate::circuit::CircuitState> {
        self.breakers.lock().get(route_id).map(|cb| cb.state)
    }

    pub fn recompute_all_breakers(&self, now: Instant) {
        for cb in self.breakers.lock().values_mut() {
            cb.recompute(now);
        }
    }

    // -- stats (STATS_GET) ----------------------------------------------

    pub fn record_request(&self, route_id: &RouteId, status: u16, latency_ms: u32) {
        self.counters.lock().entry(route_id.clone()).or_default().record(status, latency_ms);
    }

    pub fn stats_snapshot(&self) -> Vec<RouteStats> {
        self.counters.lock().iter().map(|(id, counters)| counters.snapshot(id.as_str())).collect()
    }
}

/// Process-wide session table. Safe for concurrent access by the accept
/// loop, per-connection readers, and the GC sweeper.
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, service: String, instance: String, maintenance_port: u16, metadata: Value, now: Instant, now_millis: u128) -> Arc<Session> {
        let id = SessionId::generate(&service, now_millis);
        let session = Arc::new(Session::new(id.clone(), service, instance, maintenance_port, metadata, now));
        self.sessions.write().insert(id, session.clone());
        session
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn retire(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Arc<Session>> {
        self.sessions.read().values().cloned().collect()
    }
}
