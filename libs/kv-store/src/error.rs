//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Refusing to store null value for key {0}")]
    NullValue(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type KvResult<T> = Result<T, KvError>;
