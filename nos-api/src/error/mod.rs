//! Error handling module for NOS operating system

use core::fmt;
use alloc::string::{String, ToString};

/// Common error type used throughout NOS kernel subsystems
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A configuration value was rejected without side effects
    InvalidConfiguration(String),
    /// Out of memory
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl From<alloc::collections::TryReserveError> for Error {
    fn from(_: alloc::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}

/// Result type for operations that can fail
pub type Result<T> = core::result::Result<T, Error>;

/// Creates a new invalid configuration error
pub fn invalid_configuration(msg: &str) -> Error {
    Error::InvalidConfiguration(msg.to_string())
}
