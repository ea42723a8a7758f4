use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::{Error, Result};

use super::{ObjectStorage, StoredObject};

/// Path under which the router serves the media directory.
pub const MEDIA_ROUTE: &str = "/media";

/// Object storage on the local disk, served back over HTTP at [`MEDIA_ROUTE`].
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url: String = public_base_url.into();
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the media directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        info!(root = %self.root.display(), "media directory ready");
        Ok(())
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|segment| segment.is_empty()) {
            return Err(Error::Storage(format!("invalid object key {:?}", key)));
        }

        let relative = Path::new(key);
        let only_normal = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !only_normal {
            return Err(Error::Storage(format!("invalid object key {:?}", key)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put_bytes(&self, key: &str, bytes: Bytes) -> Result<StoredObject> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, &bytes).await?;
        debug!(key, size = bytes.len(), "object stored");

        Ok(StoredObject {
            key: key.to_string(),
            size: bytes.len(),
        })
    }

    async fn locator(&self, object: &StoredObject) -> Result<String> {
        let path = self.path_for(&object.key)?;
        if !fs::try_exists(&path).await? {
            return Err(Error::Storage(format!("object {} does not exist", object.key)));
        }

        let encoded = object
            .key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");

        Ok(format!("{}{}/{}", self.public_base_url, MEDIA_ROUTE, encoded))
    }
}
