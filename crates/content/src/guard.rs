//! Single-writer access to records shared between tasks.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{ContentError, ContentRecord};

/// Exclusive write access to a shared record. Dropping it releases the record.
pub type RecordWriter = OwnedMutexGuard<ContentRecord>;

/// A record shared between tasks.
///
/// At most one writer exists at a time. A second [`writer`](Self::writer)
/// call while the first guard is alive fails with
/// [`ContentError::RecordBusy`] instead of queueing, so two saves can never
/// interleave their version and timestamp updates.
#[derive(Clone)]
pub struct SharedRecord {
    id: Uuid,
    inner: Arc<Mutex<ContentRecord>>,
}

impl SharedRecord {
    pub fn new(record: ContentRecord) -> Self {
        Self {
            id: record.id(),
            inner: Arc::new(Mutex::new(record)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Takes the writer guard, or fails immediately if another task holds it.
    pub fn writer(&self) -> Result<RecordWriter, ContentError> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| ContentError::RecordBusy(self.id))
    }

    /// A copy of the record, waiting for any in-flight writer to finish.
    pub async fn snapshot(&self) -> ContentRecord {
        self.inner.lock().await.clone()
    }
}
