//! The `client` module defines the representation of a connected client.
//!
//! A `Client` pairs an opaque `ConnectionId` with the transport used to reach
//! the client. The id is assigned by the server and never appears on the wire.

pub mod pubsub_client;
pub use pubsub_client::{Client, ConnectionId};
