use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::Result;

pub mod local;

pub use local::LocalObjectStorage;

/// Handle to bytes that have been written to object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: usize,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` under the caller-chosen `key`, replacing anything already there.
    async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<StoredObject>;
    /// Returns a stable locator from which the object can be fetched later.
    async fn locator(&self, object: &StoredObject) -> Result<String>;
}
