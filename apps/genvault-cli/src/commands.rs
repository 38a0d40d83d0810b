use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use genvault_content::{
    ContentCategory, ContentRecord, ContentRouter, DirStorageArea, IoContext, StorageArea,
    StoreConfig,
};
use genvault_protocol::{ProgressSnapshot, RecordMetadata, StorageMode};
use genvault_sync::{Resolution, Versioned, resolve as resolve_conflict};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Metadata file kept next to each record's data files.
pub const RECORD_FILE: &str = "record.json";

pub struct StoreArgs {
    pub file: PathBuf,
    pub mime: String,
    pub mode: Option<StorageMode>,
    pub name: Option<String>,
    pub provider: String,
    pub requestor: String,
}

fn io_context<'a>(
    config: &StoreConfig,
    area: &'a DirStorageArea,
    cancel: CancellationToken,
) -> IoContext<'a> {
    let tracker = Arc::new(config.tracker());
    tracker.on_progress(Box::new(|snap: ProgressSnapshot| {
        debug!(
            completed = snap.completed_units,
            total = ?snap.total_units,
            percent = ?snap.percentage(),
            "{}",
            snap.description
        );
    }));
    IoContext::new()
        .with_storage_area(area)
        .with_tracker(tracker)
        .with_cancel(cancel)
}

pub async fn store(
    config: &StoreConfig,
    root: &Path,
    args: StoreArgs,
    cancel: CancellationToken,
) -> anyhow::Result<ContentRecord> {
    if args.name.as_deref() == Some(RECORD_FILE) {
        anyhow::bail!("{RECORD_FILE} is reserved for record metadata");
    }

    let router = ContentRouter::new(config);
    let mut record = router.new_record(args.provider, args.requestor, &args.mime)?;
    let area = DirStorageArea::new(root, record.id());
    let ctx = io_context(config, &area, cancel);

    let input = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    match record.category() {
        ContentCategory::Text => {
            let text = String::from_utf8(input).context("text input is not valid UTF-8")?;
            router.save_text(&mut record, &text, args.mode, &ctx).await?;
        }
        ContentCategory::Embedding => {
            let vector: Vec<f32> = serde_json::from_slice(&input)
                .context("embedding input must be a JSON array of numbers")?;
            router.save_embedding(&mut record, &vector, args.mode, &ctx).await?;
        }
        ContentCategory::Image | ContentCategory::Audio | ContentCategory::Video => {
            router
                .save_binary(&mut record, &input, args.name.as_deref(), args.mode, &ctx)
                .await?;
        }
    }

    write_record(&area, &record).await?;
    info!(
        record = %record.id(),
        dir = %area.dir().display(),
        "record stored"
    );
    Ok(record)
}

pub async fn load(
    config: &StoreConfig,
    root: &Path,
    id: Uuid,
    cancel: CancellationToken,
) -> anyhow::Result<Vec<u8>> {
    let area = DirStorageArea::new(root, id);
    let record = read_record(&area).await?;
    let ctx = io_context(config, &area, cancel);
    Ok(ContentRouter::new(config).get_binary(&record, &ctx).await?)
}

pub async fn inspect(root: &Path, id: Uuid) -> anyhow::Result<RecordMetadata> {
    let area = DirStorageArea::new(root, id);
    Ok(read_record(&area).await?.metadata())
}

struct Replica {
    version: u64,
    modified_at: DateTime<Utc>,
}

impl Versioned for Replica {
    fn conflict_version(&self) -> u64 {
        self.version
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }
}

pub fn resolve(local: (u64, DateTime<Utc>), remote: (u64, DateTime<Utc>)) -> Resolution {
    let local = Replica {
        version: local.0,
        modified_at: local.1,
    };
    let remote = Replica {
        version: remote.0,
        modified_at: remote.1,
    };
    resolve_conflict(&local, &remote)
}

async fn write_record(area: &DirStorageArea, record: &ContentRecord) -> anyhow::Result<()> {
    area.create_directory_if_needed()
        .await
        .with_context(|| format!("failed to create {}", area.dir().display()))?;
    let json = serde_json::to_vec_pretty(record)?;
    tokio::fs::write(area.file_path(RECORD_FILE), json).await?;
    Ok(())
}

async fn read_record(area: &DirStorageArea) -> anyhow::Result<ContentRecord> {
    let path = area.file_path(RECORD_FILE);
    let json = tokio::fs::read(&path)
        .await
        .with_context(|| format!("no record at {}", path.display()))?;
    serde_json::from_slice(&json).with_context(|| format!("invalid record file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genvault_protocol::SyncStatus;
    use tempfile::TempDir;

    fn args(file: PathBuf, mime: &str) -> StoreArgs {
        StoreArgs {
            file,
            mime: mime.into(),
            mode: None,
            name: None,
            provider: "test".into(),
            requestor: "element-1".into(),
        }
    }

    #[tokio::test]
    async fn store_and_load_audio() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("take.mp3");
        std::fs::write(&input, b"ID3 fake audio").unwrap();
        let root = dir.path().join("store");
        let config = StoreConfig::default();

        let mut store_args = args(input, "audio/mpeg");
        store_args.mode = Some(StorageMode::Hybrid);
        let record = store(&config, &root, store_args, CancellationToken::new())
            .await
            .unwrap();

        assert!(root.join(record.id().to_string()).join("audio.mp3").exists());
        let bytes = load(&config, &root, record.id(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"ID3 fake audio");

        let metadata = inspect(&root, record.id()).await.unwrap();
        assert_eq!(metadata.sync_status, SyncStatus::Pending);
        assert_eq!(metadata.file_reference.unwrap().file_name, "audio.mp3");
    }

    #[tokio::test]
    async fn small_text_is_persisted_inline() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("line.txt");
        std::fs::write(&input, "FADE IN:").unwrap();
        let root = dir.path().join("store");
        let config = StoreConfig::default();

        let record = store(&config, &root, args(input, "text/plain"), CancellationToken::new())
            .await
            .unwrap();

        let record_dir = root.join(record.id().to_string());
        assert!(record_dir.join(RECORD_FILE).exists());
        assert!(!record_dir.join("text.txt").exists());
        let bytes = load(&config, &root, record.id(), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"FADE IN:");
    }

    #[tokio::test]
    async fn embedding_is_read_as_json() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("vector.json");
        std::fs::write(&input, "[0.25, -1.5, 3.0]").unwrap();
        let root = dir.path().join("store");

        let record = store(
            &StoreConfig::default(),
            &root,
            args(input, "application/x-embedding"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let router = ContentRouter::default();
        let vector = router
            .get_embedding(&record, &IoContext::new())
            .await
            .unwrap();
        assert_eq!(vector, vec![0.25, -1.5, 3.0]);
    }

    #[tokio::test]
    async fn reserved_name_is_refused() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("frame.png");
        std::fs::write(&input, b"png").unwrap();

        let mut store_args = args(input, "image/png");
        store_args.name = Some(RECORD_FILE.into());
        let result = store(
            &StoreConfig::default(),
            dir.path(),
            store_args,
            CancellationToken::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unsupported_mime_surfaces_content_error() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, b"%PDF").unwrap();

        let err = store(
            &StoreConfig::default(),
            dir.path(),
            args(input, "application/pdf"),
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(err.downcast_ref::<genvault_content::ContentError>().is_some());
    }

    #[test]
    fn resolve_prefers_higher_version() {
        let t = Utc::now();
        assert_eq!(resolve((2, t), (1, t)), Resolution::UseLocal);
        assert_eq!(resolve((1, t), (2, t)), Resolution::UseRemote);
    }
}
