//! Pipeline error types.

use thiserror::Error;

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error types.
#[derive(Error, Debug)]
pub enum Error {
    /// Frame or word decoding error.
    #[error("decode error: {0}")]
    DecodeError(#[from] latrd_decode::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] latrd_core::Error),

    /// A decode worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
