//! Chunked file I/O with cooperative cancellation and progress tracking.
//!
//! [`ChunkedIo`] moves whole byte buffers to and from disk in fixed-size
//! chunks, reporting through a [`ProgressTracker`] and checking for
//! cancellation at every chunk boundary.

mod chunked;
mod progress;
mod validation;

use std::path::PathBuf;

pub use chunked::{ChunkedIo, WriteOutcome, checksum_bytes};
pub use progress::{ProgressHandler, ProgressTracker};
pub use validation::validate_file_name;

/// Default chunk size: 1 MiB.
///
/// Progress granularity and cancellation latency are both one chunk, so this
/// value is part of the observable contract.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cancelled")]
    Cancelled,

    #[error("invalid file name: {0}")]
    InvalidPath(String),
}

impl TransferError {
    /// Short name of the operation that failed (`write`, `read`, ...).
    pub fn operation(&self) -> &'static str {
        match self {
            TransferError::Write { .. } => "write",
            TransferError::Read { .. } => "read",
            TransferError::Metadata { .. } => "stat",
            TransferError::Cancelled => "cancel",
            TransferError::InvalidPath(_) => "validate",
        }
    }
}
