//! Applying remote sync results to local records.

use genvault_protocol::SyncStatus;
use genvault_sync::{ChangeTag, PushPayload, RemoteSync, RemoteSyncError, Resolution, Versioned, resolve};
use tracing::{debug, info, warn};

use crate::{ContentError, ContentRecord, MimeType};

/// Settles a divergence between `local` and the remote copy of the same record.
///
/// - `UseRemote`: the remote bytes become the record's only content, and its
///   version and timestamp are taken over verbatim. Status becomes `synced`.
///   A previously referenced local file is no longer pointed to; removing
///   it is up to the caller.
/// - `UseLocal`: content is untouched. Status becomes `synced` when both
///   sides are identical in version and time, `pending` otherwise.
/// - `MergeNotImplemented`: nothing changes except the status, `conflict`.
pub fn reconcile(local: &mut ContentRecord, remote: PushPayload) -> Result<Resolution, ContentError> {
    if remote.record_id != local.id() {
        return Err(RemoteSyncError::Rejected {
            record_id: remote.record_id,
            reason: format!("payload does not belong to record {}", local.id()),
        }
        .into());
    }

    let resolution = resolve(&*local, &remote);
    match resolution {
        Resolution::UseRemote => {
            let mime_type = MimeType::parse(&remote.metadata.mime_type)?;
            local.set_mime_type(mime_type);
            local.set_remote_asset(remote.bytes);
            local.clear_inline();
            if let Some(dropped) = local.take_file_reference() {
                debug!(record = %local.id(), file = %dropped.file_name, "local file superseded by remote copy");
            }
            local.adopt_version(remote.metadata.conflict_version, remote.metadata.modified_at);
            local.apply_sync_outcome(SyncStatus::Synced);
        }
        Resolution::UseLocal => {
            let identical = local.conflict_version() == remote.conflict_version()
                && local.modified_at() == remote.modified_at();
            let status = if identical {
                SyncStatus::Synced
            } else {
                SyncStatus::Pending
            };
            local.apply_sync_outcome(status);
        }
        Resolution::MergeNotImplemented => {
            local.apply_sync_outcome(SyncStatus::Conflict);
        }
    }

    info!(record = %local.id(), ?resolution, version = local.conflict_version(), "record reconciled");
    Ok(resolution)
}

/// Pushes the record's remote copy if it is waiting to be pushed.
///
/// Returns the change tag on success. A failed push marks the record
/// `failed` and returns the error; retrying is the caller's decision.
pub async fn push_pending(
    record: &mut ContentRecord,
    remote: &dyn RemoteSync,
) -> Result<Option<ChangeTag>, ContentError> {
    if record.sync_status() != SyncStatus::Pending {
        return Ok(None);
    }
    let Some(payload) = record.push_payload() else {
        debug!(record = %record.id(), "pending record has no remote copy, nothing to push");
        return Ok(None);
    };

    match remote.push(payload).await {
        Ok(tag) => {
            record.apply_sync_outcome(SyncStatus::Synced);
            info!(record = %record.id(), tag = %tag, "record pushed");
            Ok(Some(tag))
        }
        Err(e) => {
            record.apply_sync_outcome(SyncStatus::Failed);
            warn!(record = %record.id(), error = %e, "push failed");
            Err(e.into())
        }
    }
}

/// Pulls the remote copy of `record`, if any, and reconciles with it.
pub async fn pull_and_reconcile(
    record: &mut ContentRecord,
    remote: &dyn RemoteSync,
) -> Result<Option<Resolution>, ContentError> {
    match remote.pull(record.id()).await? {
        Some(payload) => reconcile(record, payload).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{DateTime, Duration, Utc};
    use genvault_protocol::StorageMode;
    use genvault_sync::{PushMetadata, RemoteFuture};
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;
    use crate::{ContentRouter, DirStorageArea, IoContext};

    /// In-memory remote keyed by record id.
    #[derive(Default)]
    struct MemoryRemote {
        store: Mutex<HashMap<Uuid, PushPayload>>,
        offline: AtomicBool,
    }

    impl RemoteSync for MemoryRemote {
        fn push(&self, payload: PushPayload) -> RemoteFuture<'_, ChangeTag> {
            Box::pin(async move {
                if self.offline.load(Ordering::SeqCst) {
                    return Err(RemoteSyncError::Unavailable("offline".into()));
                }
                let tag = ChangeTag(format!("v{}", payload.metadata.conflict_version));
                self.store.lock().unwrap().insert(payload.record_id, payload);
                Ok(tag)
            })
        }

        fn pull(&self, record_id: Uuid) -> RemoteFuture<'_, Option<PushPayload>> {
            Box::pin(async move { Ok(self.store.lock().unwrap().get(&record_id).cloned()) })
        }

        fn change_tag(&self, record_id: Uuid) -> RemoteFuture<'_, Option<ChangeTag>> {
            Box::pin(async move {
                Ok(self
                    .store
                    .lock()
                    .unwrap()
                    .get(&record_id)
                    .map(|p| ChangeTag(format!("v{}", p.metadata.conflict_version))))
            })
        }
    }

    fn remote_copy(
        record: &ContentRecord,
        version: u64,
        at: DateTime<Utc>,
        bytes: &[u8],
    ) -> PushPayload {
        PushPayload {
            record_id: record.id(),
            metadata: PushMetadata {
                provider_id: record.provider_id().to_string(),
                mime_type: record.mime_type().to_string(),
                conflict_version: version,
                modified_at: at,
            },
            bytes: bytes.to_vec(),
        }
    }

    async fn hybrid_text(text: &str) -> ContentRecord {
        let router = ContentRouter::default();
        let mut record = router
            .new_record("p", "r", "text/plain")
            .unwrap()
            .with_storage_mode(StorageMode::Hybrid);
        router.save_text(&mut record, text, None, &IoContext::new()).await.unwrap();
        record
    }

    #[tokio::test]
    async fn newer_remote_replaces_local_content() {
        let mut local = hybrid_text("local draft").await;
        let later = local.modified_at() + Duration::seconds(5);
        let remote = remote_copy(&local, local.conflict_version() + 1, later, b"remote rewrite");

        let resolution = reconcile(&mut local, remote).unwrap();

        assert_eq!(resolution, Resolution::UseRemote);
        assert_eq!(local.conflict_version(), 2);
        assert_eq!(local.modified_at(), later);
        assert_eq!(local.sync_status(), SyncStatus::Synced);
        assert!(local.inline_content().is_none());
        let text = ContentRouter::default().get_text(&local, &IoContext::new()).await.unwrap();
        assert_eq!(text, "remote rewrite");
    }

    #[tokio::test]
    async fn remote_win_drops_local_file_reference() {
        let root = TempDir::new().unwrap();
        let area = DirStorageArea::new(root.path(), Uuid::new_v4());
        let ctx = IoContext::new().with_storage_area(&area);
        let router = ContentRouter::default();
        let mut local = router.new_record("p", "r", "image/png").unwrap();
        router.save_binary(&mut local, b"local", None, None, &ctx).await.unwrap();

        let remote = remote_copy(&local, 9, local.modified_at(), b"remote");
        reconcile(&mut local, remote).unwrap();

        assert!(local.file_reference().is_none());
        assert_eq!(router.get_binary(&local, &ctx).await.unwrap(), b"remote");
    }

    #[tokio::test]
    async fn newer_local_is_kept_and_stays_pending() {
        let mut local = hybrid_text("v1").await;
        let router = ContentRouter::default();
        router.save_text(&mut local, "v2", None, &IoContext::new()).await.unwrap();
        let remote = remote_copy(&local, 1, local.modified_at(), b"v1");

        let resolution = reconcile(&mut local, remote).unwrap();

        assert_eq!(resolution, Resolution::UseLocal);
        assert_eq!(local.sync_status(), SyncStatus::Pending);
        assert_eq!(router.get_text(&local, &IoContext::new()).await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn identical_copies_settle_as_synced() {
        let mut local = hybrid_text("same").await;
        let remote = remote_copy(&local, local.conflict_version(), local.modified_at(), b"same");

        assert_eq!(reconcile(&mut local, remote).unwrap(), Resolution::UseLocal);
        assert_eq!(local.sync_status(), SyncStatus::Synced);
        assert_eq!(local.conflict_version(), 1);
    }

    #[tokio::test]
    async fn foreign_payload_is_rejected() {
        let mut local = hybrid_text("mine").await;
        let mut remote = remote_copy(&local, 99, local.modified_at(), b"theirs");
        remote.record_id = Uuid::new_v4();

        let err = reconcile(&mut local, remote).unwrap_err();
        assert!(matches!(err, ContentError::Remote(RemoteSyncError::Rejected { .. })));
        assert_eq!(local.sync_status(), SyncStatus::Pending);
    }

    #[tokio::test]
    async fn unsupported_remote_mime_leaves_record_untouched() {
        let mut local = hybrid_text("mine").await;
        let mut remote = remote_copy(&local, 99, local.modified_at(), b"%PDF");
        remote.metadata.mime_type = "application/pdf".into();

        let err = reconcile(&mut local, remote).unwrap_err();
        assert!(matches!(err, ContentError::UnsupportedMimeType(_)));
        assert_eq!(local.conflict_version(), 1);
        assert_eq!(local.remote_asset(), Some(&b"mine"[..]));
    }

    #[tokio::test]
    async fn push_then_pull_round_trip() {
        let remote = MemoryRemote::default();
        let mut local = hybrid_text("to the cloud").await;
        assert_eq!(local.sync_status(), SyncStatus::Pending);

        let tag = push_pending(&mut local, &remote).await.unwrap();
        assert_eq!(tag, Some(ChangeTag("v1".into())));
        assert_eq!(local.sync_status(), SyncStatus::Synced);
        assert_eq!(remote.change_tag(local.id()).await.unwrap(), tag);

        // Nothing left to push.
        assert_eq!(push_pending(&mut local, &remote).await.unwrap(), None);

        let resolution = pull_and_reconcile(&mut local, &remote).await.unwrap();
        assert_eq!(resolution, Some(Resolution::UseLocal));
        assert_eq!(local.sync_status(), SyncStatus::Synced);
    }

    #[tokio::test]
    async fn failed_push_marks_record_failed() {
        let remote = MemoryRemote::default();
        remote.offline.store(true, Ordering::SeqCst);
        let mut local = hybrid_text("stuck").await;

        let err = push_pending(&mut local, &remote).await.unwrap_err();
        assert!(matches!(err, ContentError::Remote(RemoteSyncError::Unavailable(_))));
        assert_eq!(local.sync_status(), SyncStatus::Failed);

        // A later save does not clear the failure; the sync engine owns it.
        ContentRouter::default()
            .save_text(&mut local, "still stuck", None, &IoContext::new())
            .await
            .unwrap();
        assert_eq!(local.sync_status(), SyncStatus::Failed);
    }

    #[tokio::test]
    async fn pull_without_remote_copy_is_a_no_op() {
        let remote = MemoryRemote::default();
        let mut local = hybrid_text("only here").await;

        assert_eq!(pull_and_reconcile(&mut local, &remote).await.unwrap(), None);
        assert_eq!(local.sync_status(), SyncStatus::Pending);
    }

    #[tokio::test]
    async fn local_only_record_is_not_pushed() {
        let remote = MemoryRemote::default();
        let router = ContentRouter::default();
        let mut local = router.new_record("p", "r", "text/plain").unwrap();
        router.save_text(&mut local, "private", None, &IoContext::new()).await.unwrap();

        assert_eq!(push_pending(&mut local, &remote).await.unwrap(), None);
        assert!(remote.store.lock().unwrap().is_empty());
    }
}
