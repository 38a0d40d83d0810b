//! Conflict resolution between divergent copies of a record, and the
//! contract a remote sync backend must honor.
//!
//! Nothing in this crate performs I/O. [`resolve`] is a pure function over
//! version counters and timestamps; [`RemoteSync`] is implemented by the
//! host application on top of whatever transport it uses.

mod push;
mod resolver;

pub use push::{ChangeTag, PushMetadata, PushPayload, RemoteFuture, RemoteSync, RemoteSyncError};
pub use resolver::{Resolution, Versioned, resolve};
