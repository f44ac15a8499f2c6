//! Store wrapper that keeps vault fields encrypted at rest.

use std::sync::Arc;

use crate::document::Document;
use crate::store::ConfigFileStore;
use cfgvault_common::{Error, Result};
use cfgvault_vault::{seal_verifier, verify_master_password, MasterPassword, VaultFieldEncryptor};

/// [`ConfigFileStore`] view that decrypts vault fields on the way out and
/// encrypts them on the way in.
pub struct VaultedStore {
    store: Arc<ConfigFileStore>,
    encryptor: VaultFieldEncryptor,
}

impl VaultedStore {
    /// Wrap `store`, sealing fields with `encryptor`.
    pub fn new(store: Arc<ConfigFileStore>, encryptor: VaultFieldEncryptor) -> Self {
        Self { store, encryptor }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<ConfigFileStore> {
        &self.store
    }

    /// Load `name` with its vault fields decrypted.
    ///
    /// Fields that do not open with `password` keep their stored value.
    pub async fn load_decrypted(&self, name: &str, password: &MasterPassword) -> Result<Document> {
        let doc = self.store.load(name).await?;
        self.decrypt_document(&doc, password)
    }

    /// Encrypt the vault fields of `document` and save it as `name`.
    ///
    /// Returns the document as written, with ciphertext in its vault fields.
    /// A document without a verifier gets one sealed with `password`.
    ///
    /// # Errors
    /// - `Error::Validation` if the document carries a verifier that `password` does not match
    pub async fn save_encrypted(
        &self,
        document: Document,
        name: &str,
        password: &MasterPassword,
    ) -> Result<Document> {
        self.check_password(&document, password)?;
        let mut sealed = self.encrypt_document(&document, password)?;
        self.ensure_verifier(&mut sealed, password)?;
        self.store.save(sealed, name).await
    }

    /// Update `name` with an updater that sees plaintext vault fields.
    ///
    /// Returns the persisted document decrypted.
    pub async fn update_encrypted<U>(
        &self,
        name: &str,
        password: &MasterPassword,
        updater: U,
    ) -> Result<Document>
    where
        U: FnOnce(&mut Document),
    {
        let persisted = self
            .store
            .try_update(name, |doc| {
                self.check_password(doc, password)?;
                let mut plain = self.decrypt_document(doc, password)?;
                updater(&mut plain);
                *doc = self.encrypt_document(&plain, password)?;
                self.ensure_verifier(doc, password)
            })
            .await?;
        self.decrypt_document(&persisted, password)
    }

    fn check_password(&self, document: &Document, password: &MasterPassword) -> Result<()> {
        match &document.master_password {
            Some(verifier)
                if !verify_master_password(self.encryptor.cipher().as_ref(), verifier, password) =>
            {
                Err(Error::Validation("Master password is incorrect".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn ensure_verifier(&self, document: &mut Document, password: &MasterPassword) -> Result<()> {
        if document.master_password.is_none() {
            document.master_password =
                Some(seal_verifier(self.encryptor.cipher().as_ref(), password)?);
        }
        Ok(())
    }

    fn encrypt_document(&self, document: &Document, password: &MasterPassword) -> Result<Document> {
        let value = serde_json::to_value(document)?;
        let sealed = self.encryptor.encrypt(&value, password.expose())?;
        Ok(serde_json::from_value(sealed)?)
    }

    fn decrypt_document(&self, document: &Document, password: &MasterPassword) -> Result<Document> {
        let value = serde_json::to_value(document)?;
        let opened = self.encryptor.decrypt(&value, password.expose());
        Ok(serde_json::from_value(opened)?)
    }
}
