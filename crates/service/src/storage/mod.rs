//! Storage abstractions for service layer
//!
//! `OrderedMap` is the seam between the todo service and whatever keeps the
//! records durable. `JsonMapStore` is the file-backed implementation.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub mod json_map_store;

pub use json_map_store::JsonMapStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key is {len} bytes; maximum is {max}")]
    KeyTooLong { len: usize, max: usize },
    #[error("encoded value is {len} bytes; maximum is {max}")]
    ValueTooLarge { len: usize, max: usize },
    #[error("io error: {0}")]
    Io(String),
    #[error("codec error: {0}")]
    Codec(String),
}

impl StorageError {
    pub fn code(&self) -> u16 {
        match self {
            StorageError::KeyTooLong { .. } => 1301,
            StorageError::ValueTooLarge { .. } => 1302,
            StorageError::Io(_) => 1401,
            StorageError::Codec(_) => 1402,
        }
    }

    /// Limit violations are caller-sized problems; the rest are substrate failures.
    pub fn is_capacity(&self) -> bool {
        matches!(self, StorageError::KeyTooLong { .. } | StorageError::ValueTooLarge { .. })
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self { Self::Codec(e.to_string()) }
}

/// Per-entry size limits enforced on every insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_key_len: usize,
    /// Measured on the JSON encoding of the value.
    pub max_value_len: usize,
}

impl Default for StoreLimits {
    fn default() -> Self { Self { max_key_len: 44, max_value_len: 512 } }
}

impl StoreLimits {
    pub fn check<V: Serialize>(&self, key: &str, value: &V) -> Result<(), StorageError> {
        if key.len() > self.max_key_len {
            return Err(StorageError::KeyTooLong { len: key.len(), max: self.max_key_len });
        }
        let len = serde_json::to_vec(value)?.len();
        if len > self.max_value_len {
            return Err(StorageError::ValueTooLarge { len, max: self.max_value_len });
        }
        Ok(())
    }
}

/// Durable map from string keys to values, iterated in key order.
#[async_trait]
pub trait OrderedMap<V>: Send + Sync {
    async fn get(&self, key: &str) -> Option<V>;
    async fn len(&self) -> usize;
    async fn values(&self) -> Vec<V>;
    /// Snapshot of all entries; positions are stable for the lifetime of the snapshot.
    async fn items(&self) -> Vec<(String, V)>;
    async fn insert(&self, key: String, value: V) -> Result<Option<V>, StorageError>;
    async fn remove(&self, key: &str) -> Result<Option<V>, StorageError>;
}
