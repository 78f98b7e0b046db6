//! Durable key-value storage for the campus client
//!
//! Provides the persistence layer the feed and profile code sit on:
//! - Pluggable async backends (in-memory, one-file-per-key on disk)
//! - A typed `Storage` facade that never fails on reads and reports writes as `bool`
//! - Unified versioned key schema
//! - Metrics integration

mod config;
mod error;
mod file;
mod keys;
mod memory;
mod metrics;

pub use config::{BackendKind, StorageConfig};
pub use error::{KvError, KvResult};
pub use file::FileBackend;
pub use keys::{StorageKey, STORAGE_VERSION};
pub use memory::MemoryBackend;
pub use metrics::StorageMetrics;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw backend operations
#[async_trait::async_trait]
pub trait KvBackend: Send + Sync {
    /// Get the raw serialized value for a key
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Store a raw serialized value
    async fn set(&self, key: &str, value: String) -> KvResult<()>;

    /// Delete a key; deleting a missing key succeeds
    async fn del(&self, key: &str) -> KvResult<()>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> KvResult<bool>;
}

/// Typed storage facade shared by every component of the client
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KvBackend>,
    metrics: StorageMetrics,
}

impl Storage {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            metrics: StorageMetrics::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }

    /// Read and deserialize a value, surfacing backend and parse errors
    pub async fn try_load<T: DeserializeOwned>(&self, key: &str) -> KvResult<Option<T>> {
        let raw = match self.backend.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                self.metrics.record_error(key, "backend");
                return Err(e);
            }
        };

        match raw {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    debug!(key = %key, "Storage hit");
                    self.metrics.record_hit(key);
                    Ok(Some(value))
                }
                Err(e) => {
                    self.metrics.record_error(key, "deserialize");
                    Err(e.into())
                }
            },
            None => {
                debug!(key = %key, "Storage miss");
                self.metrics.record_miss(key);
                Ok(None)
            }
        }
    }

    /// Read a value, falling back to `default` on a missing key or any failure
    pub async fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.try_load(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(key = %key, error = %e, "Storage read failed, using default");
                default
            }
        }
    }

    /// Serialize and store a value. Values that serialize to `null` are rejected
    /// before the backend is touched.
    pub async fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KvResult<()> {
        let json = serde_json::to_value(value).map_err(|e| {
            self.metrics.record_error(key, "serialize");
            KvError::Serialization(e)
        })?;
        if json.is_null() {
            self.metrics.record_rejected_write(key);
            return Err(KvError::NullValue(key.to_string()));
        }

        let data = serde_json::to_string(&json)?;
        let bytes = data.len();
        if let Err(e) = self.backend.set(key, data).await {
            self.metrics.record_error(key, "backend");
            return Err(e);
        }

        debug!(key = %key, bytes, "Storage write");
        self.metrics.record_write(key);
        Ok(())
    }

    /// Store a value, reporting success as `bool`
    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.try_save(key, value).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Storage write failed");
                false
            }
        }
    }

    /// Remove a key, reporting success as `bool`
    pub async fn remove(&self, key: &str) -> bool {
        match self.backend.del(key).await {
            Ok(()) => {
                debug!(key = %key, "Storage remove");
                self.metrics.record_removal(key);
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Storage remove failed");
                self.metrics.record_error(key, "backend");
                false
            }
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.backend.exists(key).await.unwrap_or(false)
    }
}
