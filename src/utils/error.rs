//! The `error` module defines the error type for server startup, socket I/O
//! and transport writes.
//!
//! Protocol problems are not errors at this level: malformed frames are
//! dropped and protocol violations are answered with an `ERROR` frame.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A write was attempted after the connection closed.
    #[error("transport is closed")]
    TransportClosed,

    #[error("connection limit of {0} reached")]
    TooManyConnections(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RelayError>;
