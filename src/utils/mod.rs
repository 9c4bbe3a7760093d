//! The `utils` module provides shared definitions used across the relay:
//! the crate error type and logging setup.

pub mod error;
pub mod logging;

pub use error::{RelayError, Result};

#[cfg(test)]
mod tests;
