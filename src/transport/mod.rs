//! The `transport` module connects the relay core to real sockets.
//!
//! The core only needs three outbound primitives from a connection, captured
//! by the `Transport` trait. Inbound data and close events are pushed into a
//! `Session` by the concrete binding. `ChannelTransport` implements the trait
//! once over a per-connection channel; the WebSocket and raw TCP bindings each
//! drain that channel onto their socket.

use std::fmt::Debug;

use crate::utils::Result;

pub mod channel;
pub mod tcp;
pub mod websocket;

pub use channel::{ChannelTransport, Outbound};

/// Outbound side of one client connection.
pub trait Transport: Send + Sync + Debug {
    /// Queues an encoded frame for delivery.
    ///
    /// Fails with `RelayError::TransportClosed` once the connection is closed.
    fn send(&self, payload: String) -> Result<()>;

    /// Terminates the connection from the server side. Idempotent.
    fn close(&self);

    fn is_open(&self) -> bool;
}
