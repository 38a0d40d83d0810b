use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record-level policy for whether a remote copy is kept alongside the local one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    Remote,
    Hybrid,
}

impl StorageMode {
    /// Returns `true` when saves must also populate the remote-asset copy.
    pub fn syncs_remotely(self) -> bool {
        matches!(self, StorageMode::Remote | StorageMode::Hybrid)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Remote => "remote",
            StorageMode::Hybrid => "hybrid",
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "remote" => Ok(StorageMode::Remote),
            "hybrid" => Ok(StorageMode::Hybrid),
            other => Err(format!("unknown storage mode: {other}")),
        }
    }
}

/// Where a record stands with respect to its remote copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStatus {
    #[default]
    LocalOnly,
    Pending,
    Synced,
    Conflict,
    Failed,
}

/// Pointer to a data file inside a request's storage area.
///
/// Persisted alongside the record; never embeds the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    #[serde(rename = "requestID")]
    pub request_id: Uuid,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: String,
    /// SHA-256 hex digest of the file contents, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Advisory, type-specific metadata. Never consulted for routing, except
/// that a declared `format` feeds default file naming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ContentDetails {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Text {
        word_count: u64,
        character_count: u64,
    },
    #[serde(rename_all = "camelCase")]
    Audio {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sample_rate: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_secs: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Embedding {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dimensions: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input_text: Option<String>,
    },
}

impl ContentDetails {
    /// Sub-format declared by the generator (e.g. `mp3`, `png`), if any.
    pub fn declared_format(&self) -> Option<&str> {
        match self {
            ContentDetails::Audio { format, .. }
            | ContentDetails::Image { format, .. }
            | ContentDetails::Video { format, .. } => format.as_deref(),
            _ => None,
        }
    }
}

/// Payload-free view of a content record, as persisted and as handed to
/// the remote sync collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub id: Uuid,
    pub provider_id: String,
    #[serde(rename = "requestorID")]
    pub requestor_id: String,
    pub mime_type: String,
    pub storage_mode: StorageMode,
    pub sync_status: SyncStatus,
    pub conflict_version: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_reference: Option<FileReference>,
    #[serde(default)]
    pub details: ContentDetails,
}
