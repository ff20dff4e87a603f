//! Error taxonomy.
//!
//! `ErrorKind` is the small, serializable set of wire error kinds — it is
//! what ever reaches a client in an `ERROR|<kind>|<msg>` frame. `CoreError`
//! is the richer internal error type domain operations return; dispatchers
//! map it onto an `ErrorKind` at the wire boundary so internal `Display`
//! text never leaks past the `internal` kind's generic message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The wire error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownVerb,
    UnknownSession,
    BadArguments,
    FrameTooLarge,
    ValidationFailed,
    RouteNotFound,
    BackendUnreachable,
    Timeout,
    Conflict,
    ShuttingDown,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnknownVerb => "unknown_verb",
            ErrorKind::UnknownSession => "unknown_session",
            ErrorKind::BadArguments => "bad_arguments",
            ErrorKind::FrameTooLarge => "frame_too_large",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::RouteNotFound => "route_not_found",
            ErrorKind::BackendUnreachable => "backend_unreachable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ShuttingDown => "shutting_down",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Domain-level error returned by `rrcp-core` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown session")]
    UnknownSession,

    #[error("bad arguments: {0}")]
    BadArguments(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl CoreError {
    /// Map onto the wire error taxonomy, and the human-readable text that
    /// accompanies it. `Internal` never forwards its own message: log it
    /// with full context at the call site and return the generic kind.
    pub fn to_wire(&self) -> (ErrorKind, String) {
        match self {
            CoreError::UnknownSession => (ErrorKind::UnknownSession, "unknown session".into()),
            CoreError::BadArguments(msg) => (ErrorKind::BadArguments, msg.clone()),
            CoreError::ValidationFailed(msg) => (ErrorKind::ValidationFailed, msg.clone()),
            CoreError::RouteNotFound(msg) => (ErrorKind::RouteNotFound, msg.clone()),
            CoreError::Conflict(msg) => (ErrorKind::Conflict, msg.clone()),
            CoreError::Internal(_) => (ErrorKind::Internal, "internal error".into()),
        }
    }
}
