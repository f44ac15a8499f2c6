//! Store registry for resolving a remote configuration to an object store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use cfgvault_common::{Error, Result};
use crate::config::RemoteConfig;
use crate::directory::DirectoryObjectStore;
use crate::memory::MemoryObjectStore;
use crate::object_store::{ObjectStore, PrefixedStore};

/// Factory function type for creating stores.
///
/// Receives the remote configuration and the plaintext secret access key.
pub type StoreFactory =
    Box<dyn Fn(&RemoteConfig, &str) -> Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// Registry of store factories keyed by endpoint scheme.
///
/// A fresh registry already understands `memory://` and `file://` endpoints.
/// Memory buckets live as long as the registry, so a document migrated to
/// `memory://` can be migrated back through the same registry.
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
    memory: Arc<Mutex<HashMap<String, MemoryObjectStore>>>,
}

impl StoreRegistry {
    /// Create a registry with the built-in `memory` and `file` schemes.
    pub fn new() -> Self {
        let memory: Arc<Mutex<HashMap<String, MemoryObjectStore>>> = Arc::default();
        let mut factories: HashMap<String, StoreFactory> = HashMap::new();

        let buckets = Arc::clone(&memory);
        factories.insert(
            "memory".to_string(),
            Box::new(move |config: &RemoteConfig, _secret: &str| {
                let store = memory_bucket(&buckets, &config.bucket);
                Ok(Arc::new(store) as Arc<dyn ObjectStore>)
            }),
        );

        factories.insert(
            "file".to_string(),
            Box::new(|config: &RemoteConfig, _secret: &str| {
                let root = PathBuf::from(config.endpoint_location());
                Ok(Arc::new(DirectoryObjectStore::new(root, &config.bucket)?) as Arc<dyn ObjectStore>)
            }),
        );

        Self { factories, memory }
    }

    /// Register a factory for an endpoint scheme.
    ///
    /// # Preconditions
    /// - `scheme` must be unique within the registry
    ///
    /// # Errors
    /// - `Error::Conflict` if the scheme is already registered
    pub fn register(&mut self, scheme: impl Into<String>, factory: StoreFactory) -> Result<()> {
        let scheme = scheme.into();
        if self.factories.contains_key(&scheme) {
            return Err(Error::Conflict(format!(
                "Store scheme '{}' is already registered",
                scheme
            )));
        }
        self.factories.insert(scheme, factory);
        Ok(())
    }

    /// Resolve a store for `config`, authenticated with `secret`.
    ///
    /// The returned store already applies the configured key prefix.
    ///
    /// # Errors
    /// - `Error::Validation` if the configuration is incomplete or its scheme is unknown
    pub fn resolve(&self, config: &RemoteConfig, secret: &str) -> Result<Arc<dyn ObjectStore>> {
        config.validate()?;
        let scheme = config.scheme().ok_or_else(|| {
            Error::Validation(format!(
                "Remote endpoint '{}' has no scheme",
                config.endpoint
            ))
        })?;
        let factory = self.factories.get(scheme).ok_or_else(|| {
            Error::Validation(format!("No object store registered for scheme '{}'", scheme))
        })?;

        let store = factory(config, secret)?;
        let prefix = config.prefix_key()?;
        if prefix.is_root() {
            Ok(store)
        } else {
            Ok(Arc::new(PrefixedStore::new(store, prefix)))
        }
    }

    /// Get the shared in-memory store behind `memory://` endpoints for `bucket`.
    pub fn memory_bucket(&self, bucket: &str) -> MemoryObjectStore {
        memory_bucket(&self.memory, bucket)
    }

    /// Get list of registered schemes.
    pub fn schemes(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check if a scheme is registered.
    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.factories.contains_key(scheme)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn memory_bucket(
    buckets: &Mutex<HashMap<String, MemoryObjectStore>>,
    bucket: &str,
) -> MemoryObjectStore {
    let mut buckets = buckets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    buckets.entry(bucket.to_string()).or_default().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfgvault_common::ObjectKey;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_buckets_are_shared() {
        let registry = StoreRegistry::new();
        let config = RemoteConfig::new("memory://test", "configs", "id", "secret");

        let store = registry.resolve(&config, "secret").unwrap();
        store
            .put_text(&ObjectKey::parse("state.json").unwrap(), "{}")
            .await
            .unwrap();

        assert_eq!(store.name(), "memory");
        assert_eq!(registry.memory_bucket("configs").len().await, 1);
        assert!(registry.memory_bucket("other").is_empty().await);
    }

    #[tokio::test]
    async fn test_resolve_file_scheme_with_prefix() {
        let temp = TempDir::new().unwrap();
        let registry = StoreRegistry::new();
        let config = RemoteConfig::new(
            format!("file://{}", temp.path().display()),
            "bucket",
            "id",
            "secret",
        )
        .with_prefix("team");

        let store = registry.resolve(&config, "secret").unwrap();
        store.verify_access().await.unwrap();
        store
            .put_text(&ObjectKey::parse("ssh/id").unwrap(), "KEY")
            .await
            .unwrap();

        assert!(temp.path().join("bucket/team/ssh/id").exists());
    }

    #[test]
    fn test_resolve_unknown_scheme_fails() {
        let registry = StoreRegistry::new();
        let config = RemoteConfig::new("https://s3.example.com", "b", "id", "s");

        assert!(matches!(
            registry.resolve(&config, "s"),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_register_custom_scheme() {
        let mut registry = StoreRegistry::new();
        registry
            .register(
                "https",
                Box::new(|_: &RemoteConfig, _: &str| Ok(Arc::new(MemoryObjectStore::new()) as Arc<dyn ObjectStore>)),
            )
            .unwrap();

        let config = RemoteConfig::new("https://s3.example.com", "b", "id", "s");
        assert!(registry.resolve(&config, "s").is_ok());
        assert!(registry.has_scheme("https"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = StoreRegistry::new();
        let result = registry.register(
            "memory",
            Box::new(|_: &RemoteConfig, _: &str| Ok(Arc::new(MemoryObjectStore::new()) as Arc<dyn ObjectStore>)),
        );
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_schemes_list() {
        let registry = StoreRegistry::new();
        let schemes = registry.schemes();
        assert!(schemes.contains(&"memory".to_string()));
        assert!(schemes.contains(&"file".to_string()));
    }
}
