//! Content backends and the priority-ordered reader.
//!
//! Each backend owns one place where a record's bytes may live. Reads walk
//! the backends in a fixed order and stop at the first one that has content.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use genvault_protocol::FileReference;
use genvault_transfer::{ChunkedIo, ProgressTracker, checksum_bytes, validate_file_name};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::router::default_file_name;
use crate::{Content, ContentError, ContentRecord, StorageArea};

/// Boxed future returned by [`ContentBackend`] methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ContentError>> + Send + 'a>>;

/// Per-call I/O environment: where files go, who hears about progress, and
/// how the caller asks to stop.
#[derive(Clone)]
pub struct IoContext<'a> {
    pub storage_area: Option<&'a dyn StorageArea>,
    pub tracker: Arc<ProgressTracker>,
    pub cancel: CancellationToken,
}

impl Default for IoContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IoContext<'a> {
    /// No storage area, a fresh default tracker and an untriggered token.
    pub fn new() -> Self {
        Self {
            storage_area: None,
            tracker: Arc::new(ProgressTracker::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_storage_area(mut self, area: &'a dyn StorageArea) -> Self {
        self.storage_area = Some(area);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<ProgressTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub(crate) fn require_storage_area(
        &self,
        operation: &str,
    ) -> Result<&'a dyn StorageArea, ContentError> {
        self.storage_area.ok_or_else(|| {
            ContentError::file_op(operation, "a storage area is required for file-backed content")
        })
    }
}

/// One place a record's bytes can live.
pub trait ContentBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the record's bytes if this backend holds them.
    ///
    /// `Ok(None)` means "not here, ask the next backend"; errors stop the
    /// whole read.
    fn try_read<'a>(
        &'a self,
        record: &'a ContentRecord,
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, Option<Vec<u8>>>;

    /// Stores `bytes` for the record. Returns `false` if this backend
    /// declined the write.
    ///
    /// On error the record is left unchanged.
    fn try_write<'a>(
        &'a self,
        record: &'a mut ContentRecord,
        bytes: &'a [u8],
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, bool>;
}

/// Reports an already-resident buffer as a single, complete delivery.
pub(crate) fn deliver_resident(tracker: &ProgressTracker, len: usize, description: &str) {
    tracker.set_total_unit_count(Some(len as i64));
    tracker.complete(Some(description));
}

/// The synced copy kept for records in `remote` or `hybrid` mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoteAssetBackend;

impl ContentBackend for RemoteAssetBackend {
    fn name(&self) -> &'static str {
        "remote-asset"
    }

    fn try_read<'a>(
        &'a self,
        record: &'a ContentRecord,
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let Some(bytes) = record.remote_asset() else {
                return Ok(None);
            };
            deliver_resident(&ctx.tracker, bytes.len(), "Remote asset loaded");
            Ok(Some(bytes.to_vec()))
        })
    }

    /// Mirrors the bytes and flags the record for pushing.
    fn try_write<'a>(
        &'a self,
        record: &'a mut ContentRecord,
        bytes: &'a [u8],
        _ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            record.set_remote_asset(bytes.to_vec());
            record.mark_pending();
            Ok(true)
        })
    }
}

/// Content held in memory on the record itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineBackend;

impl ContentBackend for InlineBackend {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn try_read<'a>(
        &'a self,
        record: &'a ContentRecord,
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let Some(content) = record.inline_content() else {
                return Ok(None);
            };
            let bytes = content.to_bytes();
            deliver_resident(&ctx.tracker, bytes.len(), "Inline content loaded");
            Ok(Some(bytes))
        })
    }

    fn try_write<'a>(
        &'a self,
        record: &'a mut ContentRecord,
        bytes: &'a [u8],
        _ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let content = Content::from_bytes(record.category(), bytes)?;
            record.set_inline(content);
            Ok(true)
        })
    }
}

/// Content in a file inside the caller's storage area, moved with
/// [`ChunkedIo`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBackend {
    io: ChunkedIo,
}

impl FileBackend {
    pub fn new(io: ChunkedIo) -> Self {
        Self { io }
    }

    pub fn io(&self) -> ChunkedIo {
        self.io
    }

    /// Writes `bytes` to `file_name` (or the record's default name) and
    /// points the record at the new file.
    ///
    /// A previous file with a different name is removed once the new one
    /// is fully written; one with the same name is replaced atomically.
    /// Nothing on the record or on disk changes if the write fails or is
    /// cancelled.
    pub async fn write_named(
        &self,
        record: &mut ContentRecord,
        bytes: &[u8],
        file_name: Option<&str>,
        ctx: &IoContext<'_>,
    ) -> Result<FileReference, ContentError> {
        let area = ctx.require_storage_area("write")?;
        let (file_name, path) = resolve_target(record, area, file_name)?;

        area.create_directory_if_needed()
            .await
            .map_err(|e| ContentError::file_op("create directory", e.to_string()))?;
        let outcome = self
            .io
            .write_file(&path, bytes, &ctx.tracker, &ctx.cancel)
            .await?;

        let replaced = record
            .file_reference()
            .filter(|old| old.file_name != file_name)
            .map(|old| area.file_path(&old.file_name));
        if let Some(old_path) = replaced {
            remove_best_effort(old_path).await;
        }

        let reference = FileReference {
            request_id: area.request_id(),
            file_name,
            file_size: outcome.bytes_written as i64,
            mime_type: record.mime_type().to_string(),
            checksum: Some(outcome.checksum),
        };
        record.set_file_reference(reference.clone());
        Ok(reference)
    }

    /// Drops the record's file reference and removes the file it pointed to.
    pub(crate) async fn discard(&self, record: &mut ContentRecord, area: &dyn StorageArea) {
        if let Some(old) = record.take_file_reference() {
            remove_best_effort(area.file_path(&old.file_name)).await;
        }
    }
}

impl ContentBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn try_read<'a>(
        &'a self,
        record: &'a ContentRecord,
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            let Some(reference) = record.file_reference() else {
                return Ok(None);
            };
            let area = ctx.require_storage_area("read")?;
            validate_file_name(&reference.file_name)?;

            let path = area.file_path(&reference.file_name);
            let bytes = self.io.read_file(&path, &ctx.tracker, &ctx.cancel).await?;

            if let Some(expected) = &reference.checksum {
                let actual = checksum_bytes(&bytes);
                if !actual.eq_ignore_ascii_case(expected) {
                    return Err(ContentError::file_op(
                        "verify",
                        format!(
                            "checksum mismatch for {}: expected {expected}, got {actual}",
                            reference.file_name
                        ),
                    ));
                }
            }
            Ok(Some(bytes))
        })
    }

    fn try_write<'a>(
        &'a self,
        record: &'a mut ContentRecord,
        bytes: &'a [u8],
        ctx: &'a IoContext<'a>,
    ) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            self.write_named(record, bytes, None, ctx).await?;
            Ok(true)
        })
    }
}

/// Picks the file name and full path for a write.
fn resolve_target(
    record: &ContentRecord,
    area: &dyn StorageArea,
    file_name: Option<&str>,
) -> Result<(String, PathBuf), ContentError> {
    let name = match file_name {
        Some(name) => name.to_string(),
        None => match default_file_name(record) {
            Some(name) => name,
            None => {
                let path = area.default_data_file_path("bin");
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        ContentError::file_op("write", "storage area has no default data file")
                    })?;
                return Ok((name, path));
            }
        },
    };
    validate_file_name(&name)?;
    let path = area.file_path(&name);
    Ok((name, path))
}

async fn remove_best_effort(path: PathBuf) {
    match tokio::fs::remove_file(&path).await {
        Ok(()) => debug!(path = %path.display(), "removed replaced file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove replaced file"),
    }
}

/// Reads a record's bytes by asking each backend in turn.
///
/// The default order is remote asset, inline content, file: a record that
/// has been synced prefers its synced copy. The first backend that returns
/// content wins and later ones are never consulted.
pub struct BackendPriorityReader {
    backends: Vec<Box<dyn ContentBackend>>,
}

impl Default for BackendPriorityReader {
    fn default() -> Self {
        Self::new(ChunkedIo::default())
    }
}

impl BackendPriorityReader {
    pub fn new(io: ChunkedIo) -> Self {
        Self::with_backends(vec![
            Box::new(RemoteAssetBackend),
            Box::new(InlineBackend),
            Box::new(FileBackend::new(io)),
        ])
    }

    /// Uses exactly `backends`, in the given order.
    pub fn with_backends(backends: Vec<Box<dyn ContentBackend>>) -> Self {
        Self { backends }
    }

    /// Appends a backend after the existing ones.
    pub fn push_backend(&mut self, backend: Box<dyn ContentBackend>) {
        self.backends.push(backend);
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn read(
        &self,
        record: &ContentRecord,
        ctx: &IoContext<'_>,
    ) -> Result<Vec<u8>, ContentError> {
        for backend in &self.backends {
            if let Some(bytes) = backend.try_read(record, ctx).await? {
                debug!(
                    record = %record.id(),
                    backend = backend.name(),
                    bytes = bytes.len(),
                    "content read"
                );
                return Ok(bytes);
            }
        }
        Err(ContentError::file_op("read", "no content and no file reference"))
    }
}
