//! Artifact sink abstraction
//!
//! Object storage seen as two operations: read an object by key, write an
//! object by key. Retry and auth semantics live behind the implementation;
//! the core treats every failure as fatal for the run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Object-storage collaborator receiving persisted output documents.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Read an object, `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write an object, overwriting any existing one.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Shared artifact sink handle.
pub type SharedArtifactSink = Arc<dyn ArtifactSink>;

/// In-memory sink for tests and local runs. Records keys in write order so
/// tests can assert that the checkpoint is written last.
#[derive(Debug, Default)]
pub struct MemorySink {
    objects: RwLock<HashMap<String, Vec<u8>>>,
    write_order: RwLock<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys in the order they were written.
    pub async fn write_order(&self) -> Vec<String> {
        self.write_order.read().await.clone()
    }

    /// Parse a stored object as JSON.
    pub async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        match self.get(key).await? {
            Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).cloned())
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<()> {
        self.objects.write().await.insert(key.to_string(), body);
        self.write_order.write().await.push(key.to_string());
        Ok(())
    }
}
