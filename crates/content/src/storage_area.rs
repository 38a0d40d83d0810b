//! Where file-backed content lives on disk.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use uuid::Uuid;

/// Boxed future returned by [`StorageArea::create_directory_if_needed`].
pub type AreaFuture<'a> = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>>;

/// Host-provided location for one request's files.
///
/// The engine only needs these operations; how the host maps a request to
/// a directory is its own business.
pub trait StorageArea: Send + Sync {
    /// Identity of the request whose files live here.
    fn request_id(&self) -> Uuid;

    /// Runs on the async write path, so implementations must not block the
    /// executor.
    fn create_directory_if_needed(&self) -> AreaFuture<'_>;

    /// Path of `file_name` inside this area. The name is not validated here.
    fn file_path(&self, file_name: &str) -> PathBuf;

    /// Path of the fallback data file, `data.<extension>`.
    fn default_data_file_path(&self, extension: &str) -> PathBuf {
        self.file_path(&format!("data.{extension}"))
    }
}

/// A [`StorageArea`] rooted at `<root>/<request_id>/`.
#[derive(Debug, Clone)]
pub struct DirStorageArea {
    request_id: Uuid,
    dir: PathBuf,
}

impl DirStorageArea {
    pub fn new(root: impl AsRef<Path>, request_id: Uuid) -> Self {
        Self {
            request_id,
            dir: root.as_ref().join(request_id.to_string()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StorageArea for DirStorageArea {
    fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn create_directory_if_needed(&self) -> AreaFuture<'_> {
        Box::pin(tokio::fs::create_dir_all(&self.dir))
    }

    fn file_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}
