//! In-memory content payloads.

use serde::{Deserialize, Serialize};

use crate::{ContentCategory, ContentError};

/// Width of one embedding dimension on disk (little-endian `f32`).
const EMBEDDING_WIDTH: usize = std::mem::size_of::<f32>();

/// A content payload held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Content {
    Text(String),
    Binary(#[serde(with = "genvault_protocol::bytes::base64")] Vec<u8>),
    Embedding(Vec<f32>),
}

impl Content {
    /// Decodes raw bytes into the payload shape that fits `category`.
    pub fn from_bytes(category: ContentCategory, bytes: &[u8]) -> Result<Self, ContentError> {
        match category {
            ContentCategory::Text => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| ContentError::conversion("bytes", "text", e.to_string()))?;
                Ok(Content::Text(text.to_string()))
            }
            ContentCategory::Embedding => Ok(Content::Embedding(embedding_from_bytes(bytes)?)),
            ContentCategory::Image | ContentCategory::Audio | ContentCategory::Video => {
                Ok(Content::Binary(bytes.to_vec()))
            }
        }
    }

    /// Raw byte representation, as it would be written to a file.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Content::Text(text) => text.as_bytes().to_vec(),
            Content::Binary(data) => data.clone(),
            Content::Embedding(vector) => embedding_to_bytes(vector),
        }
    }

    /// Size of [`to_bytes`](Self::to_bytes) without materializing it.
    pub fn byte_len(&self) -> usize {
        match self {
            Content::Text(text) => text.len(),
            Content::Binary(data) => data.len(),
            Content::Embedding(vector) => vector.len() * EMBEDDING_WIDTH,
        }
    }
}

/// Encodes a vector as consecutive little-endian `f32` values.
pub fn embedding_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Reinterprets a byte buffer as little-endian `f32` values.
pub fn embedding_from_bytes(bytes: &[u8]) -> Result<Vec<f32>, ContentError> {
    if bytes.len() % EMBEDDING_WIDTH != 0 {
        return Err(ContentError::conversion(
            "bytes",
            "embedding",
            format!(
                "length {} is not a multiple of {EMBEDDING_WIDTH}",
                bytes.len()
            ),
        ));
    }
    Ok(bytes
        .chunks_exact(EMBEDDING_WIDTH)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_are_little_endian() {
        let bytes = embedding_to_bytes(&[1.0]);
        assert_eq!(bytes, vec![0x00, 0x00, 0x80, 0x3f]);
        assert_eq!(embedding_from_bytes(&bytes).unwrap(), vec![1.0]);
    }

    #[test]
    fn misaligned_embedding_is_rejected() {
        let err = embedding_from_bytes(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ContentError::TypeConversionFailed { .. }));
    }

    #[test]
    fn invalid_utf8_text_is_rejected() {
        let err = Content::from_bytes(ContentCategory::Text, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ContentError::TypeConversionFailed { .. }));
    }

    #[test]
    fn from_bytes_picks_shape_by_category() {
        assert_eq!(
            Content::from_bytes(ContentCategory::Text, b"hi").unwrap(),
            Content::Text("hi".into())
        );
        assert_eq!(
            Content::from_bytes(ContentCategory::Image, b"\x89PNG").unwrap(),
            Content::Binary(b"\x89PNG".to_vec())
        );
        let vector = [0.5f32, -2.0];
        assert_eq!(
            Content::from_bytes(ContentCategory::Embedding, &embedding_to_bytes(&vector)).unwrap(),
            Content::Embedding(vector.to_vec())
        );
    }

    #[test]
    fn byte_len_matches_encoding() {
        let contents = [
            Content::Text("héllo".into()),
            Content::Binary(vec![1, 2, 3]),
            Content::Embedding(vec![0.1, 0.2, 0.3]),
        ];
        for content in contents {
            assert_eq!(content.byte_len(), content.to_bytes().len());
        }
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_string(&Content::Binary(b"Hello".to_vec())).unwrap();
        assert_eq!(json, r#"{"type":"binary","value":"SGVsbG8="}"#);
    }
}
