//! Error types for latrd-core.

use thiserror::Error;

/// Result type alias for latrd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for latrd operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Inbound frame does not match the configured geometry.
    #[error("invalid frame: expected at least {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    /// Time-slice buffer index outside the configured range.
    #[error("time slice buffer {index} out of range (buffers: {buffers})")]
    BufferIndexOutOfRange { index: u32, buffers: usize },
}
