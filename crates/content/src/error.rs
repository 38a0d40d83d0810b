//! Content engine error types.

use genvault_sync::RemoteSyncError;
use genvault_transfer::TransferError;
use uuid::Uuid;

use crate::mime::ContentCategory;

/// Errors produced by content storage operations.
///
/// Validation errors (`UnsupportedMimeType`, `ContentTypeMismatch`) are
/// raised before any I/O. I/O and cancellation errors are returned after
/// best-effort cleanup of partial files.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("file operation '{operation}' failed: {reason}")]
    FileOperationFailed { operation: String, reason: String },

    #[error("cannot convert {from_type} to {to_type}: {reason}")]
    TypeConversionFailed {
        from_type: String,
        to_type: String,
        reason: String,
    },

    #[error("content type mismatch: expected {expected}, got {got}")]
    ContentTypeMismatch {
        expected: ContentCategory,
        got: ContentCategory,
    },

    #[error("unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("record {0} is being modified by another writer")]
    RecordBusy(Uuid),

    #[error("remote sync error: {0}")]
    Remote(#[from] RemoteSyncError),
}

impl ContentError {
    pub(crate) fn file_op(operation: &str, reason: impl Into<String>) -> Self {
        ContentError::FileOperationFailed {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conversion(from_type: &str, to_type: &str, reason: impl Into<String>) -> Self {
        ContentError::TypeConversionFailed {
            from_type: from_type.to_string(),
            to_type: to_type.to_string(),
            reason: reason.into(),
        }
    }

    /// A short, user-facing hint on how to recover from this error.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ContentError::FileOperationFailed { .. } => {
                "Check that the storage location exists, is writable and has free space, then try again."
            }
            ContentError::TypeConversionFailed { .. } => {
                "The stored content could not be decoded. Regenerate the content or check its encoding."
            }
            ContentError::ContentTypeMismatch { .. } => {
                "Use the accessor that matches the record's content type."
            }
            ContentError::UnsupportedMimeType(_) => {
                "Use a text/*, image/*, audio/*, video/* or application/x-embedding MIME type."
            }
            ContentError::Cancelled => "The operation was cancelled. Start it again to retry.",
            ContentError::RecordBusy(_) => {
                "Another save to this record is in progress. Wait for it to finish and retry."
            }
            ContentError::Remote(_) => {
                "The remote copy could not be synced. The local copy is intact; retry later."
            }
        }
    }
}

impl From<TransferError> for ContentError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Cancelled => ContentError::Cancelled,
            other => ContentError::file_op(other.operation(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_cancel_maps_to_cancelled() {
        let err: ContentError = TransferError::Cancelled.into();
        assert!(matches!(err, ContentError::Cancelled));
    }

    #[test]
    fn transfer_io_maps_to_file_operation() {
        let err: ContentError = TransferError::Write {
            path: "/data/audio.mp3".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        }
        .into();
        match err {
            ContentError::FileOperationFailed { operation, reason } => {
                assert_eq!(operation, "write");
                assert!(reason.contains("disk full"));
                assert!(reason.contains("/data/audio.mp3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn every_error_has_a_suggestion() {
        let errors = [
            ContentError::file_op("write", "boom"),
            ContentError::conversion("bytes", "String", "invalid utf-8"),
            ContentError::ContentTypeMismatch {
                expected: ContentCategory::Text,
                got: ContentCategory::Audio,
            },
            ContentError::UnsupportedMimeType("application/pdf".into()),
            ContentError::Cancelled,
            ContentError::RecordBusy(Uuid::nil()),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
            assert!(!err.recovery_suggestion().is_empty());
        }
    }

    #[test]
    fn mismatch_message_names_categories() {
        let err = ContentError::ContentTypeMismatch {
            expected: ContentCategory::Text,
            got: ContentCategory::Audio,
        };
        assert_eq!(err.to_string(), "content type mismatch: expected text, got audio");
    }
}
