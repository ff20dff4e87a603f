//! Session and route identifiers.
//!
//! Session IDs follow the format
//! `<service>-<unix-millis>-<random>` (opaque to everything except logging).
//! Route IDs are short per-session tokens (`r1`, `r2`, ...) issued by a
//! monotonic counter the staging store owns — never random, never reused.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, stable session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new session ID for `service` at `now_millis`.
    ///
    /// Format: `<service>-<unix-millis>-<random>`. The service name is
    /// sanitized to the `[a-zA-Z0-9_.-]` set so it can never smuggle a `|`
    /// into the wire frame it gets echoed back on.
    pub fn generate(service: &str, now_millis: u128) -> Self {
        let sanitized: String = service
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let random = nanoid::nanoid!(8);
        Self(format!("{sanitized}-{now_millis}-{random}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A short, per-session route token (`r1`, `r2`, ...), unique within the
/// owning session and never reissued, even after the route is removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    /// Construct the Nth route ID issued by a session (1-indexed: `r1`,
    /// `r2`, ...).
    pub fn from_counter(n: u64) -> Self {
        Self(format!("r{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The sentinel maintenance-set entry that shadows every route of a
    /// session.
    pub const ALL: &'static str = "ALL";

    pub fn is_all_sentinel(s: &str) -> bool {
        s == Self::ALL
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RouteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RouteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::borrow::Borrow<str> for RouteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_sanitizes_service_name() {
        let id = SessionId::generate("svc|A", 1_700_000_000_000);
        assert!(!id.as_str().contains('|'));
        assert!(id.as_str().starts_with("svc_A-1700000000000-"));
    }

    #[test]
    fn route_ids_are_stable_from_counter() {
        assert_eq!(RouteId::from_counter(1).as_str(), "r1");
        assert_eq!(RouteId::from_counter(2).as_str(), "r2");
        assert_ne!(RouteId::from_counter(1), RouteId::from_counter(2));
    }

    #[test]
    fn all_sentinel_recognized() {
        assert!(RouteId::is_all_sentinel("ALL"));
        assert!(!RouteId::is_all_sentinel("r1"));
    }
}
