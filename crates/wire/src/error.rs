use thiserror::Error;

/// Errors that can occur while framing or parsing a connection's byte stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame exceeds {0} bytes")]
    FrameTooLarge(usize),

    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    #[error("bad arguments: {0}")]
    BadArguments(String),

    #[error("malformed json in terminal field: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
