fn main() {
    println!("Run `cargo test -p wire-compat` to execute persisted-format compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use genvault_content::{Content, ContentCategory, ContentRecord, StoreConfig};
    use genvault_protocol::{
        ContentDetails, FileReference, ProgressSnapshot, RecordMetadata, StorageMode, SyncStatus,
    };
    use genvault_sync::{PushPayload, Resolution, resolve};

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON numbers so that `3` and `3.0` compare as equal.
    ///
    /// Embedding values are `f32` and are written with a trailing `.0` when
    /// integral; fixtures written by hand often omit it.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture, re-serializes it, and compares the JSON values
    /// (order-independent, float-normalized). Returns the parsed value.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  rust:    {reserialized}"
        );
        parsed
    }

    // --- Metadata ---

    #[test]
    fn fixture_file_reference() {
        let reference = roundtrip_test::<FileReference>("file_reference.json");
        assert_eq!(reference.file_name, "audio.mp3");
        assert_eq!(reference.file_size, 2_097_169);
        assert!(reference.checksum.is_some());
    }

    #[test]
    fn fixture_file_reference_without_checksum() {
        let reference = roundtrip_test::<FileReference>("file_reference_legacy.json");
        assert_eq!(reference.checksum, None);
    }

    #[test]
    fn fixture_record_metadata() {
        let meta = roundtrip_test::<RecordMetadata>("record_metadata.json");
        assert_eq!(meta.storage_mode, StorageMode::Hybrid);
        assert_eq!(meta.sync_status, SyncStatus::Pending);
        assert_eq!(meta.conflict_version, 3);
        assert_eq!(meta.details.declared_format(), Some("mp3"));
    }

    #[test]
    fn fixture_store_config() {
        let config = roundtrip_test::<StoreConfig>("store_config.json");
        assert_eq!(config, StoreConfig::default());
    }

    // --- Progress ---

    #[test]
    fn fixture_progress_snapshot() {
        let snap = roundtrip_test::<ProgressSnapshot>("progress_snapshot.json");
        assert_eq!(snap.total_units, Some(2_097_169));
        assert!(!snap.is_finished());
    }

    #[test]
    fn fixture_progress_snapshot_indeterminate() {
        let snap = roundtrip_test::<ProgressSnapshot>("progress_snapshot_indeterminate.json");
        assert_eq!(snap.total_units, None);
        assert_eq!(snap.fraction_completed, None);
    }

    // --- Sync ---

    #[test]
    fn fixture_push_payload() {
        let payload = roundtrip_test::<PushPayload>("push_payload.json");
        assert_eq!(payload.bytes, b"INT. KITCHEN - DAY");
        assert_eq!(payload.metadata.conflict_version, 3);
    }

    // --- Records ---

    #[test]
    fn fixture_content_record_text() {
        let record = roundtrip_test::<ContentRecord>("content_record_text.json");
        assert_eq!(record.category(), ContentCategory::Text);
        // Mirrored records keep their bytes in the remote copy only.
        assert!(record.inline_content().is_none());
        assert_eq!(record.remote_asset(), Some(&b"INT. KITCHEN - DAY"[..]));
        assert!(matches!(
            record.details(),
            ContentDetails::Text { word_count: 4, .. }
        ));
    }

    #[test]
    fn fixture_content_record_embedding() {
        let record = roundtrip_test::<ContentRecord>("content_record_embedding.json");
        assert_eq!(
            record.inline_content(),
            Some(&Content::Embedding(vec![0.25, -1.5, 3.0]))
        );
        assert_eq!(record.storage_mode(), StorageMode::Local);
    }

    #[test]
    fn record_with_unsupported_mime_is_rejected() {
        let mut fixture = load_fixture("content_record_text.json");
        fixture["mimeType"] = serde_json::json!("application/pdf");
        assert!(serde_json::from_value::<ContentRecord>(fixture).is_err());
    }

    #[test]
    fn record_metadata_matches_record_view() {
        let record: ContentRecord =
            serde_json::from_value(load_fixture("content_record_text.json")).unwrap();
        let meta = serde_json::to_value(record.metadata()).unwrap();
        assert_eq!(meta["requestorID"], "element-7");
        assert_eq!(meta["storageMode"], "hybrid");
        assert!(meta.get("inline").is_none());
        assert!(meta.get("remoteAsset").is_none());
    }

    #[test]
    fn remote_payload_versus_fixture_record() {
        let record: ContentRecord =
            serde_json::from_value(load_fixture("content_record_text.json")).unwrap();
        let payload: PushPayload = serde_json::from_value(load_fixture("push_payload.json")).unwrap();
        // Same version and timestamp on both sides.
        assert_eq!(resolve(&record, &payload), Resolution::UseLocal);
    }
}
