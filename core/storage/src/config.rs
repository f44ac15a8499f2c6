//! Remote store configuration as persisted in a document.

use serde::{Deserialize, Serialize};
use std::fmt;

use cfgvault_common::{Error, ObjectKey, Result};

fn default_region() -> String {
    "auto".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Connection settings for the object store a document lives in.
///
/// `secret_access_key` is plaintext unless `secret_encrypted` is set, in which
/// case it holds ciphertext sealed with the document's master password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// Endpoint URL; its scheme selects the store implementation.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Region, `auto` when the provider does not use regions.
    #[serde(default = "default_region")]
    pub region: String,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key, possibly password-wrapped.
    pub secret_access_key: String,
    /// Key prefix every object is stored under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Whether `secret_access_key` is ciphertext.
    #[serde(default, skip_serializing_if = "is_false")]
    pub secret_encrypted: bool,
}

impl RemoteConfig {
    /// Create a configuration with the default region and no prefix.
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: default_region(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            prefix: None,
            secret_encrypted: false,
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Endpoint scheme, e.g. `file` for `file:///srv/objects`.
    pub fn scheme(&self) -> Option<&str> {
        self.endpoint.split_once("://").map(|(scheme, _)| scheme)
    }

    /// Endpoint with its scheme removed.
    pub fn endpoint_location(&self) -> &str {
        self.endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint)
    }

    /// Parsed key prefix, root when unset.
    pub fn prefix_key(&self) -> Result<ObjectKey> {
        match &self.prefix {
            Some(prefix) => ObjectKey::parse(prefix),
            None => Ok(ObjectKey::root()),
        }
    }

    /// Check the fields every store needs.
    ///
    /// # Errors
    /// - `Error::Validation` if endpoint, bucket or access key id is empty,
    ///   or the prefix is not a valid key
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Validation("Remote endpoint is required".to_string()));
        }
        if self.bucket.trim().is_empty() {
            return Err(Error::Validation("Remote bucket is required".to_string()));
        }
        if self.access_key_id.trim().is_empty() {
            return Err(Error::Validation(
                "Remote access key id is required".to_string(),
            ));
        }
        self.prefix_key()?;
        Ok(())
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .field("secret_encrypted", &self.secret_encrypted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case() {
        let config = RemoteConfig::new("file:///srv", "configs", "AKID", "SECRET");
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(
            value,
            json!({
                "endpoint": "file:///srv",
                "bucket": "configs",
                "region": "auto",
                "accessKeyId": "AKID",
                "secretAccessKey": "SECRET",
            })
        );
    }

    #[test]
    fn test_region_defaults_to_auto() {
        let config: RemoteConfig = serde_json::from_value(json!({
            "endpoint": "memory://x",
            "bucket": "b",
            "accessKeyId": "id",
            "secretAccessKey": "s",
            "secretEncrypted": true,
        }))
        .unwrap();

        assert_eq!(config.region, "auto");
        assert!(config.secret_encrypted);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = RemoteConfig::new("memory://x", "b", "id", "topsecret");
        assert!(!format!("{:?}", config).contains("topsecret"));
    }

    #[test]
    fn test_scheme() {
        let config = RemoteConfig::new("file:///srv/objects", "b", "id", "s");
        assert_eq!(config.scheme(), Some("file"));
        assert_eq!(config.endpoint_location(), "/srv/objects");

        let bare = RemoteConfig::new("objects.local", "b", "id", "s");
        assert_eq!(bare.scheme(), None);
    }

    #[test]
    fn test_validate() {
        assert!(RemoteConfig::new("memory://x", "b", "id", "s").validate().is_ok());
        assert!(RemoteConfig::new("", "b", "id", "s").validate().is_err());
        assert!(RemoteConfig::new("memory://x", " ", "id", "s").validate().is_err());
        assert!(RemoteConfig::new("memory://x", "b", "id", "s")
            .with_prefix("a/../b")
            .validate()
            .is_err());
    }
}
