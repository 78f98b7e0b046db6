use kv_store::{BackendKind, StorageConfig, StorageKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Note {
    id: String,
    body: String,
}

#[tokio::test]
async fn file_storage_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig {
        backend: BackendKind::File,
        data_dir: dir.path().to_path_buf(),
    };

    let notes = vec![
        Note { id: "n1".into(), body: "first".into() },
        Note { id: "n2".into(), body: "second".into() },
    ];

    let storage = config.open();
    assert!(storage.save(&StorageKey::posts(), &notes).await);

    let reopened = config.open();
    let loaded: Vec<Note> = reopened.load(&StorageKey::posts(), Vec::new()).await;
    assert_eq!(loaded, notes);
}

#[tokio::test]
async fn file_storage_missing_dir_reads_default() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = StorageConfig {
        backend: BackendKind::File,
        data_dir: dir.path().join("not-created-yet"),
    };

    let storage = config.open();
    let loaded: Vec<Note> = storage.load(&StorageKey::posts(), Vec::new()).await;
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn memory_storage_is_isolated_per_open() {
    let config = StorageConfig {
        backend: BackendKind::Memory,
        data_dir: Default::default(),
    };

    let first = config.open();
    assert!(first.save(&StorageKey::user_profile(), &"profile").await);

    let second = config.open();
    assert!(!second.exists(&StorageKey::user_profile()).await);
}
