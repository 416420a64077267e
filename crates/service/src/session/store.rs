use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::StorageError;
use crate::storage::json_map_store::JsonMapStore;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Key/value storage for the session's opaque strings.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local store; state is lost on restart.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

/// Store persisted as a small JSON file.
#[derive(Clone)]
pub struct FileSessionStore {
    map: Arc<JsonMapStore<String, String>>,
}

impl FileSessionStore {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        Ok(Self { map: JsonMapStore::new(path).await? })
    }

    /// Drop every stored entry; used at startup since no guard survives a
    /// restart.
    pub async fn purge(&self) -> Result<(), StorageError> {
        self.map.update_map(|m| m.clear()).await
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.map.get(&key.to_string()).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.map.insert(key.to_string(), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.remove(&key.to_string()).await.map(|_| ())
    }
}

/// One client's slice of a shared store: every key is prefixed with the
/// namespace, so several sessions can live in one backing store without
/// seeing each other.
#[derive(Clone)]
pub struct ScopedSessionStore {
    inner: Arc<dyn SessionStore>,
    namespace: String,
}

impl ScopedSessionStore {
    pub fn new(inner: Arc<dyn SessionStore>, namespace: impl Into<String>) -> Self {
        Self { inner, namespace: namespace.into() }
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    fn key(&self, key: &str) -> String {
        format!("{}/{}", self.namespace, key)
    }
}

#[async_trait]
impl SessionStore for ScopedSessionStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(&self.key(key)).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.inner.set(&self.key(key), value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(&self.key(key)).await
    }
}
