//! The `protocol` module implements the text frame format spoken on the wire.
//!
//! A frame is a command line, zero or more `key:value` header lines, a blank
//! line, a body, and a terminating NUL byte. Several frames may be concatenated
//! in a single transport delivery.
//!
//! This module has no dependency on the rest of the crate: the broker and the
//! session layer only consume the `Frame` shape and the `encode` helper.

pub mod codec;
pub mod frame;

pub use codec::{decode, encode};
pub use frame::{Command, Frame};
