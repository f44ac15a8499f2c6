//! Object store trait definition.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use cfgvault_common::{Error, ObjectKey, Result};

/// Contract for the remote side of a migration.
///
/// All implementations must:
/// - Report a missing object as `Ok(None)`, never as an error
/// - Map transport and permission failures to `Error::Remote`
/// - Overwrite on put; the latest write wins
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get the store name (e.g., "memory", "directory").
    fn name(&self) -> &str;

    /// Check that the store is reachable and the credentials are accepted.
    ///
    /// # Errors
    /// - `Error::Remote` if the endpoint or bucket cannot be used
    async fn verify_access(&self) -> Result<()>;

    /// Get an object as text.
    async fn get_text(&self, key: &ObjectKey) -> Result<Option<String>>;

    /// Put an object as text, replacing any previous content.
    async fn put_text(&self, key: &ObjectKey, text: &str) -> Result<()>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, key: &ObjectKey) -> Result<()>;

    /// List every key below `prefix`, sorted.
    async fn list_keys(&self, prefix: &ObjectKey) -> Result<Vec<ObjectKey>>;

    /// Get an object and parse it as JSON.
    ///
    /// # Errors
    /// - `Error::Serialization` if the object is not valid JSON
    async fn get_json(&self, key: &ObjectKey) -> Result<Option<Value>> {
        match self.get_text(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` as pretty JSON and put it.
    async fn put_json(&self, key: &ObjectKey, value: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        self.put_text(key, &text).await
    }
}

/// Store view that places every key below a fixed prefix.
pub struct PrefixedStore {
    inner: Arc<dyn ObjectStore>,
    prefix: ObjectKey,
}

impl PrefixedStore {
    /// Wrap `inner` so that `key` is stored as `prefix/key`.
    pub fn new(inner: Arc<dyn ObjectStore>, prefix: ObjectKey) -> Self {
        Self { inner, prefix }
    }

    /// Get the prefix.
    pub fn prefix(&self) -> &ObjectKey {
        &self.prefix
    }
}

#[async_trait]
impl ObjectStore for PrefixedStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn verify_access(&self) -> Result<()> {
        self.inner.verify_access().await
    }

    async fn get_text(&self, key: &ObjectKey) -> Result<Option<String>> {
        self.inner.get_text(&key.under(&self.prefix)).await
    }

    async fn put_text(&self, key: &ObjectKey, text: &str) -> Result<()> {
        self.inner.put_text(&key.under(&self.prefix), text).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<()> {
        self.inner.delete(&key.under(&self.prefix)).await
    }

    async fn list_keys(&self, prefix: &ObjectKey) -> Result<Vec<ObjectKey>> {
        let skip = self.prefix.components().len();
        self.inner
            .list_keys(&prefix.under(&self.prefix))
            .await?
            .into_iter()
            .map(|key| {
                ObjectKey::from_components(key.components()[skip..].to_vec())
                    .map_err(|e| Error::Remote(format!("Invalid key from store: {}", e)))
            })
            .collect()
    }
}
