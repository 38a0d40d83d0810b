//! Multi-tier storage for generated content (text, audio, image, video,
//! vector embeddings).
//!
//! A [`ContentRecord`] owns one blob's metadata. The [`ContentRouter`]
//! decides where the bytes live: small text and embeddings stay inline,
//! everything else goes through chunked, cancellable file I/O inside a
//! caller-provided [`StorageArea`]. Records whose storage mode is `remote`
//! or `hybrid` also keep a remote-asset copy for the sync collaborator,
//! which takes the place of inline content.
//!
//! Reads go through the [`BackendPriorityReader`]: remote asset, then inline
//! content, then file. The first populated source wins.
//!
//! # Concurrency
//!
//! Mutating operations take `&mut ContentRecord`, so a single writer is
//! enforced by the borrow checker within one task. Records shared across
//! tasks go through [`SharedRecord`], whose writer guard fails fast with
//! [`ContentError::RecordBusy`] instead of interleaving two saves.

pub mod backend;
pub mod config;
pub mod content;
pub mod error;
pub mod guard;
pub mod mime;
pub mod reconcile;
pub mod record;
pub mod router;
pub mod storage_area;

pub use backend::{
    BackendFuture, BackendPriorityReader, ContentBackend, FileBackend, InlineBackend, IoContext,
    RemoteAssetBackend,
};
pub use config::{ConfigError, StoreConfig};
pub use content::Content;
pub use error::ContentError;
pub use guard::{RecordWriter, SharedRecord};
pub use mime::{ContentCategory, MimeType};
pub use reconcile::{pull_and_reconcile, push_pending, reconcile};
pub use record::ContentRecord;
pub use router::{ContentRouter, default_file_name};
pub use storage_area::{AreaFuture, DirStorageArea, StorageArea};

/// Text shorter than this many bytes may be stored inline.
pub const TEXT_INLINE_THRESHOLD: usize = 10_000;

/// Embeddings shorter than this many bytes may be stored inline.
pub const EMBEDDING_INLINE_THRESHOLD: usize = 100_000;
