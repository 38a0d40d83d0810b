//! Supported MIME types and the content categories they map to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ContentError;

/// Broad kind of content, derived once from the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Text,
    Image,
    Audio,
    Video,
    Embedding,
}

impl ContentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Text => "text",
            ContentCategory::Image => "image",
            ContentCategory::Audio => "audio",
            ContentCategory::Video => "video",
            ContentCategory::Embedding => "embedding",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated MIME type.
///
/// Only `text/*`, `image/*`, `audio/*`, `video/*` and
/// `application/x-embedding` are accepted; anything else is rejected at
/// parse time, including when deserializing persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType {
    value: String,
    category: ContentCategory,
}

impl MimeType {
    pub const EMBEDDING: &'static str = "application/x-embedding";

    /// Parses and validates a MIME type. Matching is case-insensitive and
    /// parameters (`; charset=utf-8`) are kept but ignored.
    pub fn parse(value: &str) -> Result<Self, ContentError> {
        let normalized = value.trim().to_ascii_lowercase();
        let essence = normalized.split(';').next().unwrap_or_default().trim();
        let unsupported = || ContentError::UnsupportedMimeType(value.to_string());

        let (top, sub) = essence.split_once('/').ok_or_else(unsupported)?;
        if sub.is_empty() {
            return Err(unsupported());
        }

        let category = match top {
            "text" => ContentCategory::Text,
            "image" => ContentCategory::Image,
            "audio" => ContentCategory::Audio,
            "video" => ContentCategory::Video,
            "application" if sub == "x-embedding" => ContentCategory::Embedding,
            _ => return Err(unsupported()),
        };

        Ok(Self {
            value: normalized,
            category,
        })
    }

    pub fn embedding() -> Self {
        Self {
            value: Self::EMBEDDING.to_string(),
            category: ContentCategory::Embedding,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn category(&self) -> ContentCategory {
        self.category
    }

    /// Subtype without parameters, e.g. `mpeg` for `audio/mpeg`.
    pub fn subtype(&self) -> &str {
        self.value
            .split(';')
            .next()
            .and_then(|essence| essence.split_once('/'))
            .map(|(_, sub)| sub.trim())
            .unwrap_or_default()
    }

    /// Conventional file extension for the subtype, if it is a known one.
    pub fn file_extension(&self) -> Option<&'static str> {
        let ext = match (self.category, self.subtype()) {
            (ContentCategory::Audio, "mpeg" | "mp3") => "mp3",
            (ContentCategory::Audio, "wav" | "x-wav" | "wave") => "wav",
            (ContentCategory::Audio, "ogg") => "ogg",
            (ContentCategory::Audio, "flac") => "flac",
            (ContentCategory::Audio, "aac") => "aac",
            (ContentCategory::Audio, "mp4" | "m4a" | "x-m4a") => "m4a",
            (ContentCategory::Audio, "opus") => "opus",
            (ContentCategory::Image, "png") => "png",
            (ContentCategory::Image, "jpeg" | "jpg") => "jpg",
            (ContentCategory::Image, "gif") => "gif",
            (ContentCategory::Image, "webp") => "webp",
            (ContentCategory::Video, "mp4") => "mp4",
            (ContentCategory::Video, "quicktime") => "mov",
            (ContentCategory::Video, "webm") => "webm",
            (ContentCategory::Text, "plain") => "txt",
            (ContentCategory::Text, "markdown") => "md",
            (ContentCategory::Text, "html") => "html",
            (ContentCategory::Embedding, _) => "bin",
            _ => return None,
        };
        Some(ext)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for MimeType {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MimeType {
    type Error = ContentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MimeType> for String {
    fn from(mime: MimeType) -> Self {
        mime.value
    }
}
