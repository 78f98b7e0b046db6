//! Storage configuration for the client process

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::{FileBackend, KvBackend, KvError, MemoryBackend, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    File,
}

impl FromStr for BackendKind {
    type Err = KvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(KvError::Configuration(format!(
                "unknown storage backend '{}', expected 'memory' or 'file'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Which backend holds the data
    pub backend: BackendKind,
    /// Directory for the file backend
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            data_dir: PathBuf::from(".campus-data"),
        }
    }
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> Result<Self, KvError> {
        let defaults = Self::default();
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.backend,
        };

        Ok(Self {
            backend,
            data_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        })
    }

    /// Build the configured backend behind a `Storage` facade
    pub fn open(&self) -> Storage {
        let backend: Arc<dyn KvBackend> = match self.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::File => Arc::new(FileBackend::new(self.data_dir.clone())),
        };
        Storage::new(backend)
    }
}
