use chrono::{DateTime, Utc};
use genvault_protocol::RecordMetadata;
use tracing::debug;

/// Anything carrying the two conflict-resolution signals.
pub trait Versioned {
    /// Mutation counter; higher means more edits have been applied.
    fn conflict_version(&self) -> u64;

    /// Time of the last mutation.
    fn modified_at(&self) -> DateTime<Utc>;
}

impl Versioned for RecordMetadata {
    fn conflict_version(&self) -> u64 {
        self.conflict_version
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

/// Which copy of a record to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    UseLocal,
    UseRemote,
    /// Reserved for a future merge policy. [`resolve`] never returns it;
    /// callers should treat it as unreachable for now.
    MergeNotImplemented,
}

/// Decides which of two copies of the same record wins.
///
/// The version counter is the primary signal; the modification timestamp
/// only breaks ties between equal versions. A complete tie keeps the local
/// copy so that identical records never trigger a sync round-trip.
pub fn resolve<L, R>(local: &L, remote: &R) -> Resolution
where
    L: Versioned + ?Sized,
    R: Versioned + ?Sized,
{
    let (local_version, remote_version) = (local.conflict_version(), remote.conflict_version());
    let resolution = if remote_version > local_version {
        Resolution::UseRemote
    } else if local_version > remote_version {
        Resolution::UseLocal
    } else if remote.modified_at() > local.modified_at() {
        Resolution::UseRemote
    } else {
        Resolution::UseLocal
    };

    debug!(
        local_version,
        remote_version,
        ?resolution,
        "resolved record conflict"
    );
    resolution
}
