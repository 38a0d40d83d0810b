use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{DEFAULT_CHUNK_SIZE, ProgressTracker, TransferError};

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Result of a completed [`ChunkedIo::write_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub bytes_written: u64,
    /// SHA-256 hex digest of the written bytes.
    pub checksum: String,
}

/// Moves whole buffers to and from disk in fixed-size chunks.
///
/// # Cancellation contract
///
/// Cancellation is checked after every chunk, never inside one: a chunk that
/// has started is always written (or read) in full. After a cancellation
/// request at most one further chunk of work is done before the operation
/// fails with [`TransferError::Cancelled`].
///
/// Writes are staged in a `.partial` sibling and renamed into place once
/// complete. A failed or cancelled write removes the staging file before the
/// error is returned, so no partial file survives an orderly failure and an
/// existing destination is never truncated. A process crash mid-write can
/// still leave a stray `.partial` file behind.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedIo {
    chunk_size: usize,
}

impl Default for ChunkedIo {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ChunkedIo {
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (1 MiB) is used.
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Writes `data` to `path`, replacing any existing file.
    ///
    /// The bytes go to a staging sibling (`<name>.partial`) that is renamed
    /// over `path` only after the last chunk is flushed, so a previous file
    /// at `path` stays intact until the new one is complete.
    ///
    /// Buffers no larger than one chunk are written with a single call.
    /// Larger buffers go through the chunk loop, which checks `cancel` (and
    /// the tracker's own cancel flag) and reports cumulative bytes after each
    /// chunk. The tracker always receives a forced completion snapshot on
    /// success.
    pub async fn write_file(
        &self,
        path: &Path,
        data: &[u8],
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<WriteOutcome, TransferError> {
        tracker.set_total_unit_count(Some(data.len() as i64));

        // Nothing has been touched yet, so an existing file must survive.
        if is_cancelled(tracker, cancel) {
            return Err(TransferError::Cancelled);
        }

        let staging = staging_path(path)?;
        let file = File::create(&staging)
            .await
            .map_err(|source| TransferError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        self.write_staged(path, &staging, file, data, tracker, cancel)
            .await
    }

    /// Streams `data` into `writer` (already open on `staging`) and moves
    /// the staging file over `path`. Any failure removes the staging file
    /// and leaves `path` as it was.
    async fn write_staged<W>(
        &self,
        path: &Path,
        staging: &Path,
        writer: W,
        data: &[u8],
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<WriteOutcome, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let written = match self.write_chunks(path, writer, data, tracker, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                remove_partial(staging).await;
                return Err(e);
            }
        };

        if let Err(source) = tokio::fs::rename(staging, path).await {
            remove_partial(staging).await;
            return Err(TransferError::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        tracker.complete(Some("File written"));
        debug!(
            path = %path.display(),
            bytes = written.bytes_written,
            "file written"
        );
        Ok(written)
    }

    async fn write_chunks<W>(
        &self,
        path: &Path,
        mut writer: W,
        data: &[u8],
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<WriteOutcome, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let write_err = |source: std::io::Error| TransferError::Write {
            path: path.to_path_buf(),
            source,
        };
        let total = data.len();
        let mut hasher = Sha256::new();

        if total <= self.chunk_size {
            writer.write_all(data).await.map_err(write_err)?;
            hasher.update(data);
            tracker.update(
                total as i64,
                "Writing file",
                Some(byte_info(total, total)),
                false,
            );
        } else {
            let mut written = 0usize;
            for chunk in data.chunks(self.chunk_size) {
                writer.write_all(chunk).await.map_err(write_err)?;
                hasher.update(chunk);
                written += chunk.len();

                if is_cancelled(tracker, cancel) {
                    return Err(TransferError::Cancelled);
                }
                tracker.update(
                    written as i64,
                    "Writing file",
                    Some(byte_info(written, total)),
                    false,
                );
            }
        }

        writer.flush().await.map_err(write_err)?;
        // Dropped before the rename so the handle is closed on every platform.
        drop(writer);

        Ok(WriteOutcome {
            bytes_written: total as u64,
            checksum: hex::encode(hasher.finalize()),
        })
    }

    /// Reads the whole file at `path`.
    ///
    /// The file size is looked up first and becomes the tracker's total.
    /// Files no larger than one chunk are read with a single call; larger
    /// files are read chunk by chunk with the same cancellation and progress
    /// rules as [`write_file`](Self::write_file). The source file is never
    /// modified, even on cancellation.
    pub async fn read_file(
        &self,
        path: &Path,
        tracker: &ProgressTracker,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, TransferError> {
        let read_err = |source: std::io::Error| TransferError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| TransferError::Metadata {
                path: path.to_path_buf(),
                source,
            })?
            .len() as usize;
        tracker.set_total_unit_count(Some(size as i64));

        if is_cancelled(tracker, cancel) {
            return Err(TransferError::Cancelled);
        }

        if size <= self.chunk_size {
            let data = tokio::fs::read(path).await.map_err(read_err)?;
            tracker.update(
                data.len() as i64,
                "Reading file",
                Some(byte_info(data.len(), size)),
                false,
            );
            tracker.complete(Some("File read"));
            return Ok(data);
        }

        let mut file = File::open(path).await.map_err(read_err)?;
        let mut data = Vec::with_capacity(size);
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            let n = read_full(&mut file, &mut chunk).await.map_err(read_err)?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            if is_cancelled(tracker, cancel) {
                return Err(TransferError::Cancelled);
            }
            tracker.update(
                data.len() as i64,
                "Reading file",
                Some(byte_info(data.len(), size)),
                false,
            );
        }

        tracker.complete(Some("File read"));
        debug!(path = %path.display(), bytes = data.len(), "file read");
        Ok(data)
    }
}

fn is_cancelled(tracker: &ProgressTracker, cancel: &CancellationToken) -> bool {
    cancel.is_cancelled() || tracker.is_cancelled()
}

fn byte_info(done: usize, total: usize) -> String {
    format!("{done} of {total} bytes")
}

/// `<dir>/<name>.partial`, the sibling a write is staged in.
fn staging_path(path: &Path) -> Result<PathBuf, TransferError> {
    let name = path
        .file_name()
        .ok_or_else(|| TransferError::InvalidPath(path.display().to_string()))?;
    let mut staged = name.to_os_string();
    staged.push(".partial");
    Ok(path.with_file_name(staged))
}

/// Fills `buf` unless EOF comes first. Returns the number of bytes read.
async fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Best-effort removal of a partially written file.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
}
