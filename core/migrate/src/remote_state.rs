//! Objects a remote-mode document keeps in its object store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use cfgvault_common::{ObjectKey, Result};
use cfgvault_storage::ObjectStore;
use cfgvault_store::Document;
use cfgvault_vault::{MasterPassword, VaultFieldEncryptor};

/// Key of the schema marker.
pub const META_KEY: &str = "_meta.json";
/// Key of the inventories.
pub const STATE_KEY: &str = "state.json";
/// Key of the SSH private key.
pub const SSH_PRIVATE_KEY: &str = "ssh/id";
/// Key of the SSH public key.
pub const SSH_PUBLIC_KEY: &str = "ssh/id.pub";

const SCHEMA_VERSION: u32 = 2;
const STATE_VERSION: u32 = 1;

pub(crate) fn key(raw: &str) -> Result<ObjectKey> {
    ObjectKey::parse(raw)
}

/// Schema marker written once per bucket prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMeta {
    /// Layout version.
    pub schema_version: u32,
    /// When the layout was first written.
    pub created_at: DateTime<Utc>,
    /// Writer identification.
    pub created_by: String,
}

impl RemoteMeta {
    /// Marker for the current layout.
    pub fn current() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            created_by: format!("cfgvault/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Write the marker unless one is already present.
    pub async fn ensure(store: &dyn ObjectStore) -> Result<RemoteMeta> {
        let meta_key = key(META_KEY)?;
        if let Some(existing) = store.get_json(&meta_key).await? {
            if let Ok(meta) = serde_json::from_value::<RemoteMeta>(existing) {
                return Ok(meta);
            }
        }
        let meta = Self::current();
        store.put_json(&meta_key, &serde_json::to_value(&meta)?).await?;
        Ok(meta)
    }
}

fn default_state_version() -> u32 {
    STATE_VERSION
}

/// Inventories of a remote-mode document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteState {
    /// State format version.
    #[serde(default = "default_state_version")]
    pub version: u32,
    /// Whether vault fields are sealed with the master password.
    #[serde(default)]
    pub encrypted: bool,
    /// Machine inventory.
    #[serde(default)]
    pub machines: Map<String, Value>,
    /// Storage inventory.
    #[serde(default)]
    pub storages: Map<String, Value>,
    /// Repository inventory.
    #[serde(default)]
    pub repositories: Map<String, Value>,
}

impl Default for RemoteState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            encrypted: false,
            machines: Map::new(),
            storages: Map::new(),
            repositories: Map::new(),
        }
    }
}

impl RemoteState {
    /// Copy the inventories of a local document, with vault fields opened
    /// when `password` is given.
    pub fn from_document(
        document: &Document,
        encryptor: &VaultFieldEncryptor,
        password: Option<&MasterPassword>,
    ) -> Result<Self> {
        let state = Self {
            machines: document.machines.clone().unwrap_or_default(),
            storages: document.storages.clone().unwrap_or_default(),
            repositories: document.repositories.clone().unwrap_or_default(),
            ..Self::default()
        };
        match password {
            Some(password) => {
                let opened = encryptor.decrypt(&serde_json::to_value(&state)?, password.expose());
                Ok(serde_json::from_value(opened)?)
            }
            None => Ok(state),
        }
    }

    /// Read `state.json`, opening vault fields when `password` is given.
    ///
    /// A missing object yields empty inventories.
    pub async fn read(
        store: &dyn ObjectStore,
        encryptor: &VaultFieldEncryptor,
        password: Option<&MasterPassword>,
    ) -> Result<Self> {
        let Some(raw) = store.get_json(&key(STATE_KEY)?).await? else {
            return Ok(Self::default());
        };
        let opened = match password {
            Some(password) => encryptor.decrypt(&raw, password.expose()),
            None => raw,
        };
        let mut state: RemoteState = serde_json::from_value(opened)?;
        // Fields are plaintext now unless nothing could open them.
        state.encrypted = state.encrypted && password.is_none();
        Ok(state)
    }

    /// Write `state.json`, sealing vault fields when `password` is given.
    pub async fn write(
        &self,
        store: &dyn ObjectStore,
        encryptor: &VaultFieldEncryptor,
        password: Option<&MasterPassword>,
    ) -> Result<()> {
        let mut state = self.clone();
        state.encrypted = password.is_some();
        let value = serde_json::to_value(&state)?;
        let sealed = match password {
            Some(password) => encryptor.encrypt(&value, password.expose())?,
            None => value,
        };
        store.put_json(&key(STATE_KEY)?, &sealed).await
    }
}
