//! Persisted document model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use uuid::Uuid;

use cfgvault_storage::RemoteConfig;

/// Where a document's working state lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Inventories and SSH paths are stored in the document itself.
    #[default]
    Local,
    /// Working state lives in an object store; the document only points at it.
    #[serde(alias = "s3")]
    Remote,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Local => f.write_str("local"),
            Mode::Remote => f.write_str("remote"),
        }
    }
}

/// Paths of the SSH key pair a local document uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKeyPaths {
    /// Private key file.
    pub private_key_path: PathBuf,
    /// Public key file; `<private>.pub` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_path: Option<PathBuf>,
}

impl SshKeyPaths {
    /// Public key path, falling back to `<private>.pub`.
    pub fn public_key_path_or_default(&self) -> PathBuf {
        match &self.public_key_path {
            Some(path) => path.clone(),
            None => {
                let mut path = self.private_key_path.clone().into_os_string();
                path.push(".pub");
                PathBuf::from(path)
            }
        }
    }
}

/// A named, versioned configuration document.
///
/// Fields this crate does not manage are kept in `extra` and written back
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Identifier assigned when the document is created.
    pub id: String,
    /// Incremented by exactly one on every save.
    #[serde(default)]
    pub version: u64,
    /// Current mode.
    #[serde(default)]
    pub mode: Mode,
    /// Machine inventory (local mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machines: Option<Map<String, Value>>,
    /// Storage inventory (local mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storages: Option<Map<String, Value>>,
    /// Repository inventory (local mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Map<String, Value>>,
    /// SSH key pair (local mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshKeyPaths>,
    /// Object store settings (remote mode).
    #[serde(default, alias = "s3", skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    /// Master password verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_password: Option<String>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Create an empty local document at version 0 with a fresh id.
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            version: 0,
            mode: Mode::Local,
            machines: None,
            storages: None,
            repositories: None,
            ssh: None,
            remote: None,
            master_password: None,
            extra: Map::new(),
        }
    }

    /// Whether the document carries any inventory.
    pub fn has_inventories(&self) -> bool {
        self.machines.is_some() || self.storages.is_some() || self.repositories.is_some()
    }

    /// Drop every local-mode field.
    pub fn clear_local_state(&mut self) {
        self.machines = None;
        self.storages = None;
        self.repositories = None;
        self.ssh = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document() {
        let doc = Document::empty();
        assert_eq!(doc.version, 0);
        assert_eq!(doc.mode, Mode::Local);
        assert!(Uuid::parse_str(&doc.id).is_ok());
        assert!(!doc.has_inventories());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent() {
        let mut doc = Document::empty();
        doc.id = "abc".to_string();
        doc.ssh = Some(SshKeyPaths {
            private_key_path: PathBuf::from("/home/u/.ssh/id"),
            public_key_path: None,
        });

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "abc",
                "version": 0,
                "mode": "local",
                "ssh": {"privateKeyPath": "/home/u/.ssh/id"},
            })
        );
    }

    #[test]
    fn test_extra_fields_preserved_in_order() {
        let raw = r#"{"id":"x","version":3,"mode":"local","zeta":1,"alpha":{"nested":true}}"#;
        let doc: Document = serde_json::from_str(raw).unwrap();

        assert_eq!(doc.extra.keys().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(serde_json::to_string(&doc).unwrap(), raw);
    }

    #[test]
    fn test_legacy_s3_spelling_accepted() {
        let doc: Document = serde_json::from_value(json!({
            "id": "x",
            "version": 1,
            "mode": "s3",
            "s3": {
                "endpoint": "memory://x",
                "bucket": "b",
                "accessKeyId": "id",
                "secretAccessKey": "s",
            },
        }))
        .unwrap();

        assert_eq!(doc.mode, Mode::Remote);
        assert_eq!(doc.remote.unwrap().bucket, "b");
    }

    #[test]
    fn test_public_key_path_default() {
        let paths = SshKeyPaths {
            private_key_path: PathBuf::from("/keys/id_ed25519"),
            public_key_path: None,
        };
        assert_eq!(
            paths.public_key_path_or_default(),
            PathBuf::from("/keys/id_ed25519.pub")
        );
    }

    #[test]
    fn test_clear_local_state() {
        let mut doc = Document::empty();
        doc.machines = Some(Map::new());
        doc.clear_local_state();
        assert!(!doc.has_inventories());
        assert!(doc.ssh.is_none());
    }
}
