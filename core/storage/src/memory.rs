//! In-memory object store for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::object_store::ObjectStore;
use cfgvault_common::{Error, ObjectKey, Result};

#[derive(Default)]
struct Inner {
    objects: RwLock<BTreeMap<String, String>>,
    unreachable: AtomicBool,
    fail_writes: AtomicBool,
}

/// In-memory object store.
///
/// Clones share the same objects, so a test can keep a handle and inspect
/// what a migration wrote. Switches simulate an unreachable endpoint and a
/// store that rejects writes.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Inner>,
}

impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every request fail as if the endpoint were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make puts fail while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.inner.objects.read().await.len()
    }

    /// Check if the store holds no objects.
    pub async fn is_empty(&self) -> bool {
        self.inner.objects.read().await.is_empty()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Remote("Memory store is unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn verify_access(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn get_text(&self, key: &ObjectKey) -> Result<Option<String>> {
        self.check_reachable()?;
        let objects = self.inner.objects.read().await;
        Ok(objects.get(&key.as_key_string()).cloned())
    }

    async fn put_text(&self, key: &ObjectKey, text: &str) -> Result<()> {
        self.check_reachable()?;
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Remote(format!("Write rejected for '{}'", key)));
        }
        if key.is_root() {
            return Err(Error::Validation("Object key cannot be empty".to_string()));
        }
        let mut objects = self.inner.objects.write().await;
        objects.insert(key.as_key_string(), text.to_string());
        Ok(())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<()> {
        self.check_reachable()?;
        let mut objects = self.inner.objects.write().await;
        objects.remove(&key.as_key_string());
        Ok(())
    }

    async fn list_keys(&self, prefix: &ObjectKey) -> Result<Vec<ObjectKey>> {
        self.check_reachable()?;
        let objects = self.inner.objects.read().await;
        objects
            .keys()
            .map(|k| ObjectKey::parse(k))
            .filter(|k| match k {
                Ok(key) => key.starts_with(prefix),
                Err(_) => true,
            })
            .collect()
    }
}
