//! Namespaced key-value storage for plugins.
//!
//! The host always passes the calling plugin's name as the namespace, so
//! plugins using the same key never see each other's values.

use crate::error::KvError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value storage keyed by `(namespace, key)`.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// `Ok(None)` when the key is absent.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    async fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), KvError>;

    /// Deleting an absent key is not an error.
    async fn delete(&self, namespace: &str, key: &str) -> Result<(), KvError>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all namespaces.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<(), KvError> {
        let mut entries = self.entries.write().await;
        entries.insert((namespace.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<(), KvError> {
        let mut entries = self.entries.write().await;
        entries.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}
