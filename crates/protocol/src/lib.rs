//! Persisted metadata and progress types shared by the genvault crates.
//!
//! Everything here is plain data with a stable camelCase JSON shape: it is
//! what gets written next to a record's data files and what the remote sync
//! collaborator sees. No I/O lives in this crate.

pub mod bytes;
pub mod progress;
pub mod types;

pub use progress::ProgressSnapshot;
pub use types::{ContentDetails, FileReference, RecordMetadata, StorageMode, SyncStatus};
