//! Filesystem-backed object store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::object_store::ObjectStore;
use cfgvault_common::{Error, ObjectKey, Result};

/// Object store that keeps each object as a file below `<root>/<bucket>`.
///
/// Serves `file://` endpoints, which is handy for shared network drives and
/// for exercising migrations without a network.
pub struct DirectoryObjectStore {
    endpoint_root: PathBuf,
    bucket_root: PathBuf,
}

fn remote_err(context: &str, err: std::io::Error) -> Error {
    Error::Remote(format!("{}: {}", context, err))
}

impl DirectoryObjectStore {
    /// Create a store for `bucket` below the endpoint directory `root`.
    ///
    /// Nothing is touched on disk until the first request.
    pub fn new(root: impl AsRef<Path>, bucket: &str) -> Result<Self> {
        let bucket_key = ObjectKey::parse(bucket)?;
        if bucket_key.components().len() != 1 {
            return Err(Error::Validation(format!(
                "Bucket name '{}' must be a single path component",
                bucket
            )));
        }
        let endpoint_root = root.as_ref().to_path_buf();
        let bucket_root = endpoint_root.join(bucket);
        Ok(Self {
            endpoint_root,
            bucket_root,
        })
    }

    /// Directory holding the bucket's objects.
    pub fn bucket_root(&self) -> &Path {
        &self.bucket_root
    }

    fn to_fs_path(&self, key: &ObjectKey) -> PathBuf {
        let mut fs_path = self.bucket_root.clone();
        for component in key.components() {
            fs_path.push(component);
        }
        fs_path
    }
}

#[async_trait]
impl ObjectStore for DirectoryObjectStore {
    fn name(&self) -> &str {
        "directory"
    }

    async fn verify_access(&self) -> Result<()> {
        let meta = fs::metadata(&self.endpoint_root)
            .await
            .map_err(|e| remote_err("Endpoint directory is not reachable", e))?;
        if !meta.is_dir() {
            return Err(Error::Remote(format!(
                "Endpoint {} is not a directory",
                self.endpoint_root.display()
            )));
        }
        fs::create_dir_all(&self.bucket_root)
            .await
            .map_err(|e| remote_err("Bucket is not writable", e))?;
        debug!(bucket = %self.bucket_root.display(), "Directory store reachable");
        Ok(())
    }

    async fn get_text(&self, key: &ObjectKey) -> Result<Option<String>> {
        match fs::read_to_string(self.to_fs_path(key)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(remote_err(&format!("Failed to read '{}'", key), e)),
        }
    }

    async fn put_text(&self, key: &ObjectKey, text: &str) -> Result<()> {
        if key.is_root() {
            return Err(Error::Validation("Object key cannot be empty".to_string()));
        }
        let fs_path = self.to_fs_path(key);
        if let Some(parent) = fs_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| remote_err(&format!("Failed to prepare '{}'", key), e))?;
        }

        // Write beside the target and rename so readers never see half an object.
        let tmp = fs_path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = fs::write(&tmp, text).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(remote_err(&format!("Failed to write '{}'", key), e));
        }
        if let Err(e) = fs::rename(&tmp, &fs_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(remote_err(&format!("Failed to write '{}'", key), e));
        }
        Ok(())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<()> {
        match fs::remove_file(self.to_fs_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(remote_err(&format!("Failed to delete '{}'", key), e)),
        }
    }

    async fn list_keys(&self, prefix: &ObjectKey) -> Result<Vec<ObjectKey>> {
        let mut keys = Vec::new();
        let mut pending = vec![prefix.clone()];

        while let Some(dir_key) = pending.pop() {
            let mut entries = match fs::read_dir(self.to_fs_path(&dir_key)).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) if e.kind() == ErrorKind::NotADirectory => {
                    keys.push(dir_key);
                    continue;
                }
                Err(e) => return Err(remote_err("Failed to list objects", e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| remote_err("Failed to list objects", e))?
            {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(".tmp") {
                    continue;
                }
                let child = dir_key.join(&name)?;
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| remote_err("Failed to list objects", e))?;
                if file_type.is_dir() {
                    pending.push(child);
                } else {
                    keys.push(child);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}
