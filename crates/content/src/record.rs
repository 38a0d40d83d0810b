//! The content record: one generated blob plus its metadata.

use chrono::{DateTime, Utc};
use genvault_protocol::{ContentDetails, FileReference, RecordMetadata, StorageMode, SyncStatus};
use genvault_sync::{PushMetadata, PushPayload, Versioned};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Content, ContentCategory, ContentError, MimeType};

/// Metadata and content locations for one generated blob.
///
/// At rest exactly one location is authoritative: inline content, a file
/// reference, or the remote-asset copy, read in the order documented on
/// [`BackendPriorityReader`](crate::BackendPriorityReader). Fields are only
/// changed through [`ContentRouter`](crate::ContentRouter) operations and
/// the sync helpers in [`reconcile`](mod@crate::reconcile).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    id: Uuid,
    provider_id: String,
    #[serde(rename = "requestorID")]
    requestor_id: String,
    mime_type: MimeType,
    #[serde(default)]
    storage_mode: StorageMode,
    #[serde(default)]
    sync_status: SyncStatus,
    conflict_version: u64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file_reference: Option<FileReference>,
    #[serde(
        default,
        with = "genvault_protocol::bytes::base64_opt",
        skip_serializing_if = "Option::is_none"
    )]
    remote_asset: Option<Vec<u8>>,
    #[serde(default)]
    details: ContentDetails,
}

impl ContentRecord {
    /// Creates an empty record for a freshly arrived generation result.
    ///
    /// Fails with [`ContentError::UnsupportedMimeType`] before anything else
    /// happens if `mime_type` is not one of the supported categories.
    pub fn new(
        provider_id: impl Into<String>,
        requestor_id: impl Into<String>,
        mime_type: &str,
    ) -> Result<Self, ContentError> {
        let mime_type = MimeType::parse(mime_type)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            provider_id: provider_id.into(),
            requestor_id: requestor_id.into(),
            mime_type,
            storage_mode: StorageMode::default(),
            sync_status: SyncStatus::default(),
            conflict_version: 0,
            created_at: now,
            modified_at: now,
            inline: None,
            file_reference: None,
            remote_asset: None,
            details: ContentDetails::default(),
        })
    }

    pub fn with_storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    pub fn with_details(mut self, details: ContentDetails) -> Self {
        self.details = details;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn requestor_id(&self) -> &str {
        &self.requestor_id
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn category(&self) -> ContentCategory {
        self.mime_type.category()
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage_mode
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn conflict_version(&self) -> u64 {
        self.conflict_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn inline_content(&self) -> Option<&Content> {
        self.inline.as_ref()
    }

    pub fn file_reference(&self) -> Option<&FileReference> {
        self.file_reference.as_ref()
    }

    pub fn remote_asset(&self) -> Option<&[u8]> {
        self.remote_asset.as_deref()
    }

    pub fn details(&self) -> &ContentDetails {
        &self.details
    }

    /// Returns `true` if no location holds any content.
    pub fn is_empty(&self) -> bool {
        self.inline.is_none() && self.file_reference.is_none() && self.remote_asset.is_none()
    }

    /// Records a mutation: bumps the conflict version and the modification time.
    pub fn touch(&mut self) {
        self.conflict_version += 1;
        self.modified_at = Utc::now();
    }

    /// Applies a sync outcome reported by the remote collaborator.
    ///
    /// Status transitions are bookkeeping, not content edits, so the conflict
    /// version is left alone.
    pub fn apply_sync_outcome(&mut self, status: SyncStatus) {
        tracing::debug!(record = %self.id, from = ?self.sync_status, to = ?status, "sync status changed");
        self.sync_status = status;
    }

    /// Payload-free view for persistence and the sync collaborator.
    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            id: self.id,
            provider_id: self.provider_id.clone(),
            requestor_id: self.requestor_id.clone(),
            mime_type: self.mime_type.to_string(),
            storage_mode: self.storage_mode,
            sync_status: self.sync_status,
            conflict_version: self.conflict_version,
            created_at: self.created_at,
            modified_at: self.modified_at,
            file_reference: self.file_reference.clone(),
            details: self.details.clone(),
        }
    }

    /// Snapshot destined for the remote backend, if a remote copy is held.
    pub fn push_payload(&self) -> Option<PushPayload> {
        let bytes = self.remote_asset.clone()?;
        Some(PushPayload {
            record_id: self.id,
            metadata: PushMetadata {
                provider_id: self.provider_id.clone(),
                mime_type: self.mime_type.to_string(),
                conflict_version: self.conflict_version,
                modified_at: self.modified_at,
            },
            bytes,
        })
    }

    pub(crate) fn set_inline(&mut self, content: Content) {
        self.inline = Some(content);
    }

    pub(crate) fn clear_inline(&mut self) {
        self.inline = None;
    }

    pub(crate) fn set_file_reference(&mut self, reference: FileReference) {
        self.file_reference = Some(reference);
    }

    pub(crate) fn take_file_reference(&mut self) -> Option<FileReference> {
        self.file_reference.take()
    }

    pub(crate) fn set_remote_asset(&mut self, bytes: Vec<u8>) {
        self.remote_asset = Some(bytes);
    }

    pub(crate) fn clear_remote_asset(&mut self) {
        self.remote_asset = None;
    }

    pub(crate) fn set_storage_mode(&mut self, mode: StorageMode) {
        self.storage_mode = mode;
    }

    pub(crate) fn set_mime_type(&mut self, mime_type: MimeType) {
        self.mime_type = mime_type;
    }

    pub(crate) fn details_mut(&mut self) -> &mut ContentDetails {
        &mut self.details
    }

    /// Flags freshly mirrored bytes for pushing.
    ///
    /// `Conflict` and `Failed` belong to the sync engine and are kept until
    /// it settles them.
    pub(crate) fn mark_pending(&mut self) {
        if matches!(
            self.sync_status,
            SyncStatus::LocalOnly | SyncStatus::Synced | SyncStatus::Pending
        ) {
            self.sync_status = SyncStatus::Pending;
        }
    }

    /// Takes over the remote copy's version and timestamp verbatim.
    pub(crate) fn adopt_version(&mut self, conflict_version: u64, modified_at: DateTime<Utc>) {
        self.conflict_version = conflict_version;
        self.modified_at = modified_at;
    }
}

impl Versioned for ContentRecord {
    fn conflict_version(&self) -> u64 {
        self.conflict_version
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}
