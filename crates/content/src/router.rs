//! Save and load operations for content records.

use genvault_protocol::{ContentDetails, FileReference, StorageMode};
use genvault_transfer::ChunkedIo;
use tracing::info;

use crate::backend::deliver_resident;
use crate::content::{embedding_from_bytes, embedding_to_bytes};
use crate::{
    BackendPriorityReader, Content, ContentBackend, ContentCategory, ContentError, ContentRecord,
    FileBackend, InlineBackend, IoContext, RemoteAssetBackend, StorageArea, StoreConfig,
};

/// Decides where a record's bytes live and moves them there.
///
/// Small text and embeddings stay inline on the record. Everything else is
/// written to a file in the caller's storage area. Records in `remote` or
/// `hybrid` mode additionally keep a remote-asset copy and are flagged for
/// pushing; that copy replaces any inline one. Validation (category checks)
/// always happens before any I/O.
pub struct ContentRouter {
    reader: BackendPriorityReader,
    inline: InlineBackend,
    file: FileBackend,
    remote: RemoteAssetBackend,
    text_inline_threshold: usize,
    embedding_inline_threshold: usize,
    default_mode: StorageMode,
}

impl Default for ContentRouter {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl ContentRouter {
    pub fn new(config: &StoreConfig) -> Self {
        let io = ChunkedIo::new(config.chunk_size);
        Self {
            reader: BackendPriorityReader::new(io),
            inline: InlineBackend,
            file: FileBackend::new(io),
            remote: RemoteAssetBackend,
            text_inline_threshold: config.text_inline_threshold,
            embedding_inline_threshold: config.embedding_inline_threshold,
            default_mode: config.default_storage_mode,
        }
    }

    /// Adds a read backend after the built-in ones.
    pub fn with_backend(mut self, backend: Box<dyn ContentBackend>) -> Self {
        self.reader.push_backend(backend);
        self
    }

    pub fn reader(&self) -> &BackendPriorityReader {
        &self.reader
    }

    /// Creates a record in the configured default storage mode.
    pub fn new_record(
        &self,
        provider_id: impl Into<String>,
        requestor_id: impl Into<String>,
        mime_type: &str,
    ) -> Result<ContentRecord, ContentError> {
        Ok(ContentRecord::new(provider_id, requestor_id, mime_type)?
            .with_storage_mode(self.default_mode))
    }

    /// Saves any payload, routing by its shape.
    pub async fn save(
        &self,
        record: &mut ContentRecord,
        content: &Content,
        mode: Option<StorageMode>,
        ctx: &IoContext<'_>,
    ) -> Result<(), ContentError> {
        match content {
            Content::Text(text) => self.save_text(record, text, mode, ctx).await,
            Content::Binary(data) => self
                .save_binary(record, data, None, mode, ctx)
                .await
                .map(|_| ()),
            Content::Embedding(vector) => self.save_embedding(record, vector, mode, ctx).await,
        }
    }

    /// Saves text, inline when it is below the text threshold and to
    /// `text.txt` otherwise.
    ///
    /// Text at or above the threshold needs a storage area; without one the
    /// save fails with [`ContentError::FileOperationFailed`]. So does moving
    /// a file-backed record back inline, since the old file must be removed.
    pub async fn save_text(
        &self,
        record: &mut ContentRecord,
        text: &str,
        mode: Option<StorageMode>,
        ctx: &IoContext<'_>,
    ) -> Result<(), ContentError> {
        require_category(record, ContentCategory::Text)?;
        let bytes = text.as_bytes();
        let inline = bytes.len() < self.text_inline_threshold;

        if inline {
            let replaced_file_area = replaced_file_area(record, ctx)?;
            self.inline.try_write(record, bytes, ctx).await?;
            deliver_resident(&ctx.tracker, bytes.len(), "Text stored inline");
            if let Some(area) = replaced_file_area {
                self.file.discard(record, area).await;
            }
        } else {
            self.file.write_named(record, bytes, None, ctx).await?;
            record.clear_inline();
        }

        *record.details_mut() = ContentDetails::Text {
            word_count: text.split_whitespace().count() as u64,
            character_count: text.chars().count() as u64,
        };
        self.finish_save(record, bytes, mode, inline, ctx).await
    }

    /// Saves raw bytes to a file. There is no inline path for binary data.
    ///
    /// `file_name` defaults to [`default_file_name`]. Any category is
    /// accepted.
    pub async fn save_binary(
        &self,
        record: &mut ContentRecord,
        data: &[u8],
        file_name: Option<&str>,
        mode: Option<StorageMode>,
        ctx: &IoContext<'_>,
    ) -> Result<FileReference, ContentError> {
        let reference = self.file.write_named(record, data, file_name, ctx).await?;
        record.clear_inline();
        self.finish_save(record, data, mode, false, ctx).await?;
        Ok(reference)
    }

    /// Saves a vector embedding, inline when its encoding is below the
    /// embedding threshold and to `embedding.bin` otherwise.
    pub async fn save_embedding(
        &self,
        record: &mut ContentRecord,
        vector: &[f32],
        mode: Option<StorageMode>,
        ctx: &IoContext<'_>,
    ) -> Result<(), ContentError> {
        require_category(record, ContentCategory::Embedding)?;
        let bytes = embedding_to_bytes(vector);
        let inline = bytes.len() < self.embedding_inline_threshold;

        if inline {
            let replaced_file_area = replaced_file_area(record, ctx)?;
            record.set_inline(Content::Embedding(vector.to_vec()));
            deliver_resident(&ctx.tracker, bytes.len(), "Embedding stored inline");
            if let Some(area) = replaced_file_area {
                self.file.discard(record, area).await;
            }
        } else {
            self.file.write_named(record, &bytes, None, ctx).await?;
            record.clear_inline();
        }

        let input_text = match record.details() {
            ContentDetails::Embedding { input_text, .. } => input_text.clone(),
            _ => None,
        };
        *record.details_mut() = ContentDetails::Embedding {
            dimensions: Some(vector.len() as u32),
            input_text,
        };
        self.finish_save(record, &bytes, mode, inline, ctx).await
    }

    /// Applies the storage mode after the local copy is in place, then
    /// counts the save as one mutation.
    ///
    /// Once the remote-asset copy holds the bytes, the inline copy is
    /// dropped.
    async fn finish_save(
        &self,
        record: &mut ContentRecord,
        bytes: &[u8],
        mode: Option<StorageMode>,
        inline: bool,
        ctx: &IoContext<'_>,
    ) -> Result<(), ContentError> {
        let mode = mode.unwrap_or(record.storage_mode());
        record.set_storage_mode(mode);
        if mode.syncs_remotely() {
            if self.remote.try_write(record, bytes, ctx).await? {
                record.clear_inline();
            }
        } else {
            record.clear_remote_asset();
        }
        record.touch();

        let location = match (inline, record.remote_asset().is_some()) {
            (true, true) => "remote",
            (true, false) => "inline",
            (false, _) => "file",
        };
        info!(
            record = %record.id(),
            mime = %record.mime_type(),
            mode = mode.as_str(),
            bytes = bytes.len(),
            location,
            version = record.conflict_version(),
            "content saved"
        );
        Ok(())
    }

    /// Reads the record's bytes through the backend priority chain.
    pub async fn get_content(
        &self,
        record: &ContentRecord,
        ctx: &IoContext<'_>,
    ) -> Result<Vec<u8>, ContentError> {
        self.reader.read(record, ctx).await
    }

    pub async fn get_text(
        &self,
        record: &ContentRecord,
        ctx: &IoContext<'_>,
    ) -> Result<String, ContentError> {
        require_category(record, ContentCategory::Text)?;
        let bytes = self.get_content(record, ctx).await?;
        String::from_utf8(bytes).map_err(|e| ContentError::conversion("bytes", "String", e.to_string()))
    }

    /// Raw bytes of any category.
    pub async fn get_binary(
        &self,
        record: &ContentRecord,
        ctx: &IoContext<'_>,
    ) -> Result<Vec<u8>, ContentError> {
        self.get_content(record, ctx).await
    }

    pub async fn get_embedding(
        &self,
        record: &ContentRecord,
        ctx: &IoContext<'_>,
    ) -> Result<Vec<f32>, ContentError> {
        require_category(record, ContentCategory::Embedding)?;
        let bytes = self.get_content(record, ctx).await?;
        embedding_from_bytes(&bytes)
    }
}

/// Storage area needed to remove the file an inline save supersedes.
///
/// Checked before anything is written so a missing area cannot leave an
/// orphaned file behind.
fn replaced_file_area<'a>(
    record: &ContentRecord,
    ctx: &IoContext<'a>,
) -> Result<Option<&'a dyn StorageArea>, ContentError> {
    match record.file_reference() {
        Some(_) => ctx.require_storage_area("discard").map(Some),
        None => Ok(None),
    }
}

fn require_category(record: &ContentRecord, expected: ContentCategory) -> Result<(), ContentError> {
    let got = record.category();
    if got != expected {
        return Err(ContentError::ContentTypeMismatch { expected, got });
    }
    Ok(())
}

/// Default file name for a record's content.
///
/// `text.txt` and `embedding.bin` are fixed. Audio, image and video use the
/// format declared in the record's details, else the MIME subtype's usual
/// extension (`audio.mp3`, `image.png`). Returns `None` when no format is
/// known; callers then fall back to the storage area's `data.bin`.
pub fn default_file_name(record: &ContentRecord) -> Option<String> {
    let category = record.category();
    match category {
        ContentCategory::Text => Some("text.txt".to_string()),
        ContentCategory::Embedding => Some("embedding.bin".to_string()),
        ContentCategory::Audio | ContentCategory::Image | ContentCategory::Video => {
            let declared = record
                .details()
                .declared_format()
                .map(|f| f.trim().to_ascii_lowercase())
                .filter(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_alphanumeric()));
            let format = declared.or_else(|| record.mime_type().file_extension().map(str::to_string))?;
            Some(format!("{category}.{format}"))
        }
    }
}
