//! File-backed durable backend
//!
//! One JSON document per key under a data directory. File names are the
//! hex-encoded key so arbitrary key characters stay filesystem-safe. Writes go
//! to a sibling temp file first and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{KvBackend, KvResult};

#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hex::encode(key)))
    }
}

#[async_trait::async_trait]
impl KvBackend for FileBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> KvResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value.as_bytes()).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key = %key, path = %path.display(), bytes = value.len(), "File write");
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("store"));

        assert_eq!(backend.get("v1:posts:feed").await.unwrap(), None);
        assert!(!backend.exists("v1:posts:feed").await.unwrap());

        backend
            .set("v1:posts:feed", r#"[{"id":"a"}]"#.to_string())
            .await
            .unwrap();
        assert!(backend.exists("v1:posts:feed").await.unwrap());

        // A fresh handle over the same directory sees the value
        let reopened = FileBackend::new(backend.dir().to_path_buf());
        assert_eq!(
            reopened.get("v1:posts:feed").await.unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.del("v1:user:profile").await.unwrap();
    }

    #[test]
    fn test_file_name_is_hex_encoded() {
        let backend = FileBackend::new("/data");
        let path = backend.path_for("v1:posts:feed");
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("76313a706f7374733a66656564.json")
        );
    }
}
