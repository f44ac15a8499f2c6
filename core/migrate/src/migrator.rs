//! Migration between local and remote mode.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::password::MasterPasswordResolver;
use crate::remote_state::{key, RemoteMeta, RemoteState, SSH_PRIVATE_KEY, SSH_PUBLIC_KEY};
use crate::ssh::{read_key_pair, write_key_pair, SshKeyMaterial};
use cfgvault_common::{Error, Result, SensitiveString};
use cfgvault_storage::{ObjectStore, RemoteConfig, StoreRegistry};
use cfgvault_store::{ConfigFileStore, Document, Mode};
use cfgvault_vault::{seal_verifier, verify_master_password, MasterPassword, VaultFieldEncryptor};

/// Where and how to move a local document.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    /// Object store to move to; the secret is given in plaintext.
    pub config: RemoteConfig,
    /// Master password; resolved when absent and the document needs one.
    pub master_password: Option<MasterPassword>,
}

impl RemoteTarget {
    /// Target `config` without an explicit master password.
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            master_password: None,
        }
    }

    /// Seal vault fields and the remote secret with `password`.
    pub fn with_master_password(mut self, password: MasterPassword) -> Self {
        self.master_password = Some(password);
        self
    }
}

/// Where to put the state of a remote document brought back locally.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    /// Directory receiving the SSH key pair.
    pub ssh_dir: PathBuf,
    /// Master password; resolved when absent and the document needs one.
    pub master_password: Option<MasterPassword>,
}

impl LocalTarget {
    /// Target `ssh_dir` without an explicit master password.
    pub fn new(ssh_dir: impl Into<PathBuf>) -> Self {
        Self {
            ssh_dir: ssh_dir.into(),
            master_password: None,
        }
    }

    /// Open the remote secret and vault fields with `password`.
    pub fn with_master_password(mut self, password: MasterPassword) -> Self {
        self.master_password = Some(password);
        self
    }
}

/// Any failure talking to the object store surfaces as `Error::Remote`.
fn remote_failure(err: Error) -> Error {
    match err {
        Error::Remote(_) => err,
        other => Error::Remote(other.to_string()),
    }
}

/// Moves a document's working state between the document and an object store.
///
/// Each migration runs under the document lock. The document is rewritten
/// last, after every artifact it will point at exists, so a failed migration
/// leaves the document in its original mode.
pub struct ModeMigrator {
    store: Arc<ConfigFileStore>,
    registry: Arc<StoreRegistry>,
    encryptor: VaultFieldEncryptor,
    resolver: Arc<dyn MasterPasswordResolver>,
}

impl ModeMigrator {
    /// Create a migrator.
    pub fn new(
        store: Arc<ConfigFileStore>,
        registry: Arc<StoreRegistry>,
        encryptor: VaultFieldEncryptor,
        resolver: Arc<dyn MasterPasswordResolver>,
    ) -> Self {
        Self {
            store,
            registry,
            encryptor,
            resolver,
        }
    }

    /// Move document `name` from local to remote mode.
    ///
    /// # Errors
    /// - `Error::Validation` if the document is not local, the secret is empty,
    ///   a required master password is missing or does not match the verifier,
    ///   or a recorded SSH key is missing
    /// - `Error::Remote` if the object store cannot be reached or written
    pub async fn to_remote(&self, name: &str, target: RemoteTarget) -> Result<Document> {
        self.store
            .locked(name, async {
                self.store.invalidate(name).await;
                let doc = self.store.load(name).await?;
                if doc.mode != Mode::Local {
                    return Err(Error::Validation(format!(
                        "Document '{}' is in {} mode, expected local",
                        name, doc.mode
                    )));
                }

                let RemoteTarget {
                    config,
                    master_password,
                } = target;
                if config.secret_access_key.is_empty() {
                    return Err(Error::Validation(
                        "Remote secret access key is required".to_string(),
                    ));
                }
                config.validate()?;
                let secret = SensitiveString::new(config.secret_access_key.clone());

                let required = doc.master_password.is_some();
                let password = self
                    .resolve_password(name, &doc, master_password, required)
                    .await?;

                let remote = self.connect(&config, &secret).await?;

                let state = RemoteState::from_document(&doc, &self.encryptor, password.as_ref())?;
                let keys = match &doc.ssh {
                    Some(paths) => Some(read_key_pair(paths).await?),
                    None => None,
                };

                RemoteMeta::ensure(remote.as_ref())
                    .await
                    .map_err(remote_failure)?;
                state
                    .write(remote.as_ref(), &self.encryptor, password.as_ref())
                    .await
                    .map_err(remote_failure)?;
                if let Some(keys) = &keys {
                    upload_keys(remote.as_ref(), keys).await?;
                }

                let mut stored = config;
                let mut verifier = doc.master_password.clone();
                if let Some(password) = &password {
                    let cipher = self.encryptor.cipher().as_ref();
                    stored.secret_access_key = cipher.encrypt(secret.expose(), password.expose())?;
                    stored.secret_encrypted = true;
                    if verifier.is_none() {
                        verifier = Some(seal_verifier(cipher, password)?);
                    }
                }

                let migrated = self
                    .store
                    .try_update(name, move |doc| {
                        if doc.mode != Mode::Local {
                            return Err(Error::Validation(
                                "Document changed mode during migration".to_string(),
                            ));
                        }
                        doc.mode = Mode::Remote;
                        doc.remote = Some(stored);
                        doc.master_password = verifier;
                        doc.clear_local_state();
                        Ok(())
                    })
                    .await?;

                info!(
                    name,
                    store = remote.name(),
                    machines = state.machines.len(),
                    encrypted = password.is_some(),
                    "Migrated document to remote mode"
                );
                Ok(migrated)
            })
            .await
    }

    /// Move document `name` from remote to local mode.
    ///
    /// Remote objects are left in place.
    ///
    /// # Errors
    /// - `Error::Validation` if the document is not remote, has no remote
    ///   configuration, or the master password is missing
    /// - `Error::Crypto` if the remote secret does not open with the password
    /// - `Error::Remote` if the object store cannot be reached
    pub async fn to_local(&self, name: &str, target: LocalTarget) -> Result<Document> {
        self.store
            .locked(name, async {
                self.store.invalidate(name).await;
                let doc = self.store.load(name).await?;
                if doc.mode != Mode::Remote {
                    return Err(Error::Validation(format!(
                        "Document '{}' is in {} mode, expected remote",
                        name, doc.mode
                    )));
                }
                let config = doc.remote.clone().ok_or_else(|| {
                    Error::Validation(format!("Document '{}' has no remote configuration", name))
                })?;

                let LocalTarget {
                    ssh_dir,
                    master_password,
                } = target;
                let required = config.secret_encrypted;
                let password = self
                    .resolve_password(name, &doc, master_password, required)
                    .await?;

                let secret = match (&password, config.secret_encrypted) {
                    (Some(password), true) => SensitiveString::new(
                        self.encryptor
                            .cipher()
                            .decrypt(&config.secret_access_key, password.expose())
                            .map_err(|_| {
                                Error::Crypto("Failed to decrypt remote secret".to_string())
                            })?,
                    ),
                    (None, true) => {
                        return Err(Error::Validation(
                            "Master password is required to open the remote secret".to_string(),
                        ));
                    }
                    (_, false) => SensitiveString::new(config.secret_access_key.clone()),
                };

                let remote = self.connect(&config, &secret).await?;

                let state = RemoteState::read(remote.as_ref(), &self.encryptor, password.as_ref())
                    .await?;
                // A document migrated without SSH keys comes back without them.
                let ssh = match remote.get_text(&key(SSH_PRIVATE_KEY)?).await? {
                    Some(private_key) => {
                        let keys = SshKeyMaterial {
                            private_key: SensitiveString::new(private_key),
                            public_key: remote.get_text(&key(SSH_PUBLIC_KEY)?).await?,
                        };
                        let paths = write_key_pair(&ssh_dir, &keys).await?;
                        debug!(name, dir = %ssh_dir.display(), "Wrote SSH key pair");
                        Some(paths)
                    }
                    None => {
                        debug!(name, "Remote store holds no SSH keys");
                        None
                    }
                };

                let machines = state.machines.len();
                let migrated = self
                    .store
                    .try_update(name, move |doc| {
                        if doc.mode != Mode::Remote {
                            return Err(Error::Validation(
                                "Document changed mode during migration".to_string(),
                            ));
                        }
                        doc.mode = Mode::Local;
                        doc.machines = Some(state.machines);
                        doc.storages = Some(state.storages);
                        doc.repositories = Some(state.repositories);
                        doc.ssh = ssh;
                        doc.remote = None;
                        doc.master_password = None;
                        Ok(())
                    })
                    .await?;

                info!(name, machines, "Migrated document to local mode");
                Ok(migrated)
            })
            .await
    }

    async fn connect(
        &self,
        config: &RemoteConfig,
        secret: &SensitiveString,
    ) -> Result<Arc<dyn ObjectStore>> {
        let remote = self.registry.resolve(config, secret.expose())?;
        remote.verify_access().await.map_err(remote_failure)?;
        debug!(store = remote.name(), bucket = %config.bucket, "Remote store reachable");
        Ok(remote)
    }

    /// Pick the explicit password or ask the resolver, and check it against
    /// the document's verifier.
    async fn resolve_password(
        &self,
        name: &str,
        doc: &Document,
        explicit: Option<MasterPassword>,
        required: bool,
    ) -> Result<Option<MasterPassword>> {
        let password = match explicit {
            Some(password) => Some(password),
            None if required => self.resolver.resolve(name).await?,
            None => None,
        };

        match (&password, &doc.master_password) {
            (None, _) if required => Err(Error::Validation(format!(
                "Master password is required for '{}'",
                name
            ))),
            (Some(password), Some(verifier))
                if !verify_master_password(self.encryptor.cipher().as_ref(), verifier, password) =>
            {
                Err(Error::Validation("Master password is incorrect".to_string()))
            }
            _ => Ok(password),
        }
    }
}

async fn upload_keys(remote: &dyn ObjectStore, keys: &SshKeyMaterial) -> Result<()> {
    remote
        .put_text(&key(SSH_PRIVATE_KEY)?, keys.private_key.expose())
        .await
        .map_err(remote_failure)?;
    if let Some(public_key) = &keys.public_key {
        remote
            .put_text(&key(SSH_PUBLIC_KEY)?, public_key)
            .await
            .map_err(remote_failure)?;
    }
    Ok(())
}
