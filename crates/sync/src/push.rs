//! The local-side contract of a remote sync backend.
//!
//! The engine hands the backend a full byte buffer plus the metadata needed
//! for conflict arbitration. Transport, change-tag issuance and retries all
//! belong to the implementation.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Versioned;

/// Opaque revision marker issued by the remote backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeTag(pub String);

impl std::fmt::Display for ChangeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata sent with every pushed blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMetadata {
    pub provider_id: String,
    pub mime_type: String,
    pub conflict_version: u64,
    pub modified_at: DateTime<Utc>,
}

/// A full snapshot of one record's content, as exchanged with the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub record_id: Uuid,
    pub metadata: PushMetadata,
    #[serde(with = "genvault_protocol::bytes::base64")]
    pub bytes: Vec<u8>,
}

impl Versioned for PushPayload {
    fn conflict_version(&self) -> u64 {
        self.metadata.conflict_version
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.metadata.modified_at
    }
}

/// Errors a remote backend may report back to the engine.
#[derive(Debug, thiserror::Error)]
pub enum RemoteSyncError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote rejected record {record_id}: {reason}")]
    Rejected { record_id: Uuid, reason: String },
}

/// Boxed future returned by [`RemoteSync`] methods.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RemoteSyncError>> + Send + 'a>>;

/// Remote sync backend, implemented by the host application.
pub trait RemoteSync: Send + Sync {
    /// Uploads a snapshot and returns the change tag the remote assigned.
    fn push(&self, payload: PushPayload) -> RemoteFuture<'_, ChangeTag>;

    /// Downloads the remote snapshot of a record, if the remote has one.
    fn pull(&self, record_id: Uuid) -> RemoteFuture<'_, Option<PushPayload>>;

    /// Current change tag of a record on the remote, if any.
    fn change_tag(&self, record_id: Uuid) -> RemoteFuture<'_, Option<ChangeTag>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> PushPayload {
        PushPayload {
            record_id: Uuid::nil(),
            metadata: PushMetadata {
                provider_id: "elevenlabs".into(),
                mime_type: "audio/mpeg".into(),
                conflict_version: 3,
                modified_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            },
            bytes: b"Hello".to_vec(),
        }
    }

    #[test]
    fn payload_json_shape() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["metadata"]["providerId"], "elevenlabs");
        assert_eq!(json["metadata"]["conflictVersion"], 3);
        assert_eq!(json["bytes"], "SGVsbG8=");
    }

    #[test]
    fn payload_is_versioned() {
        let p = payload();
        assert_eq!(p.conflict_version(), 3);
        assert_eq!(p.modified_at(), p.metadata.modified_at);
    }

    #[test]
    fn change_tag_is_transparent() {
        let tag = ChangeTag("etag-7".into());
        assert_eq!(serde_json::to_string(&tag).unwrap(), r#""etag-7""#);
        assert_eq!(tag.to_string(), "etag-7");
    }
}
