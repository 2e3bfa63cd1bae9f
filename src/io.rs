use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::bail;
use async_trait::async_trait;
use tokio::fs::{create_dir_all, read_to_string, remove_file, rename, write};
use tokio::sync::RwLock;

/// A keyed store of whole string blobs. Every read and write replaces the entire value.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()>;

    /// Returns whether a value was present.
    async fn remove(&self, key: &str) -> anyhow::Result<bool>;
}

/// Blobs persisted as `<root>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub async fn open<P: Into<PathBuf>>(root: P) -> anyhow::Result<Self> {
        let root = root.into();
        create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Invalid blob key `{}`", key)
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl BlobStorage for FileStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.blob_path(key)?;
        match read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes beside the blob and renames over it, so readers see the old
    /// value or the new one and never a torn write.
    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        let path = self.blob_path(key)?;
        let staged = path.with_extension("json.tmp");
        write(&staged, value).await?;
        if let Err(err) = rename(&staged, &path).await {
            let _ = remove_file(&staged).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<bool> {
        let path = self.blob_path(key)?;
        match remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Blobs that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStorage for MemoryStorage {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.blobs.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.blobs.write().await.remove(key).is_some())
    }
}
