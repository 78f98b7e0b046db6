//! In-process backend
//!
//! Values live for the lifetime of the process. Used by tests and by the
//! client when no durable directory is configured.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::{KvBackend, KvResult};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> KvResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }
}
