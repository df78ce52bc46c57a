//! Decoder error types.

use thiserror::Error;

use crate::word::WordKind;

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoder error types.
#[derive(Error, Debug)]
pub enum Error {
    /// An accessor was applied to a word of the other class.
    #[error("expected {expected} word, got {word:#018x}")]
    WordType {
        /// Class the accessor requires.
        expected: WordKind,
        /// Offending raw word.
        word: u64,
    },

    /// A fine timestamp matched neither the current nor the previous coarse period.
    #[error(
        "timestamp mismatch: fine {fine:#x} against coarse {current:#x} (previous {previous:#x})"
    )]
    TimestampMismatch {
        /// Fine timestamp carried by the event.
        fine: u64,
        /// Most recent coarse timestamp.
        current: u64,
        /// Coarse timestamp before that.
        previous: u64,
    },

    /// Read past the end of a byte buffer.
    #[error("unexpected end of data at byte {offset} (length {len})")]
    UnexpectedEnd {
        /// Byte offset of the failed read.
        offset: usize,
        /// Length of the buffer.
        len: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON configuration error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] latrd_core::Error),
}
