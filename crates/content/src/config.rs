//! Store configuration.
//!
//! A single JSON file; every field is optional and falls back to the
//! built-in default.

use std::path::Path;
use std::time::Duration;

use genvault_protocol::StorageMode;
use genvault_transfer::{DEFAULT_CHUNK_SIZE, ProgressTracker};
use serde::{Deserialize, Serialize};

use crate::{EMBEDDING_INLINE_THRESHOLD, TEXT_INLINE_THRESHOLD};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for a content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Chunk size for file I/O. 0 means the 1 MiB default.
    pub chunk_size: usize,

    /// Minimum spacing between progress deliveries, in milliseconds.
    pub progress_interval_ms: u64,

    pub text_inline_threshold: usize,

    pub embedding_inline_threshold: usize,

    /// Mode applied by saves that don't name one.
    pub default_storage_mode: StorageMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval_ms: 100,
            text_inline_threshold: TEXT_INLINE_THRESHOLD,
            embedding_inline_threshold: EMBEDDING_INLINE_THRESHOLD,
            default_storage_mode: StorageMode::Local,
        }
    }
}

impl StoreConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields the defaults. A file that exists but does not
    /// parse is logged and also yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<StoreConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse store config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes the configuration as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// A fresh tracker using this configuration's delivery interval.
    pub fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(Some(self.progress_interval()))
    }
}
