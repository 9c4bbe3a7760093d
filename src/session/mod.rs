//! The `session` module drives one client connection.
//!
//! A concrete transport binding creates a `Session` when a client connects,
//! feeds it every inbound payload with `on_data`, and calls `on_close` when the
//! connection ends. The session decodes frames, dispatches each command against
//! the shared broker, and writes replies through the connection's transport.

pub mod connection;

pub use connection::{Session, SessionState};

#[cfg(test)]
mod tests;
