//! # stomprelay
//!
//! `stomprelay` is a minimal, in-memory publish/subscribe relay that speaks a
//! subset of the STOMP text frame protocol. Clients connect over WebSocket (or
//! raw TCP), subscribe to named destinations, and publish messages that are
//! fanned out to every connection currently subscribed.
//!
//! ## Core Modules
//!
//! - `protocol`: frame parsing and serialization.
//! - `broker`: the subscription registry and the broadcast engine.
//! - `client`: the server-side handle for one connection.
//! - `session`: per-connection lifecycle and command dispatch.
//! - `transport`: the transport abstraction and the WebSocket and TCP bindings.
//! - `config`: loading server configuration.
//! - `utils`: error type and logging setup.
//!
//! Nothing is persisted: all state lives in memory for the life of the process.

pub mod broker;
pub mod client;
pub mod config;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod utils;
