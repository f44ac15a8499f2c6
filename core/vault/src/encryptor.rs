//! Selective encryption of vault fields.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::walk::{map_fields, try_map_fields};
use cfgvault_common::Result;
use cfgvault_crypto::{CipherProvider, PasswordCipher};

/// Whether an object key names a vault field.
pub fn is_vault_field(key: &str) -> bool {
    key.to_ascii_lowercase().contains("vault")
}

/// Whether any reachable vault field holds a non-empty string.
pub fn has_vault_fields(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(key, child)| match child {
            Value::String(s) => is_vault_field(key) && !s.is_empty(),
            _ => has_vault_fields(child),
        }),
        Value::Array(items) => items.iter().any(has_vault_fields),
        _ => false,
    }
}

/// Loose check that a string could be base64 ciphertext.
///
/// Values failing this check are left alone by [`VaultFieldEncryptor::decrypt`]
/// without spending a key derivation on them.
fn looks_like_base64(s: &str) -> bool {
    let body = s.trim_end_matches('=');
    !body.is_empty()
        && s.len() - body.len() <= 2
        && body
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/')
}

/// Encrypts and decrypts the vault fields of a JSON document.
///
/// Every other field, and the shape of the document, is left untouched.
#[derive(Clone)]
pub struct VaultFieldEncryptor {
    cipher: Arc<dyn CipherProvider>,
}

impl VaultFieldEncryptor {
    /// Create an encryptor over the given cipher.
    pub fn new(cipher: Arc<dyn CipherProvider>) -> Self {
        Self { cipher }
    }

    /// Get the underlying cipher.
    pub fn cipher(&self) -> &Arc<dyn CipherProvider> {
        &self.cipher
    }

    /// Return a copy of `value` with every vault field encrypted under `password`.
    ///
    /// An empty password or a `null` value returns the input unchanged. Values
    /// that are already ciphertext are kept as they are, so encrypting twice
    /// is the same as encrypting once.
    ///
    /// # Errors
    /// - Propagates the first cipher failure; nothing is partially encrypted
    pub fn encrypt(&self, value: &Value, password: &str) -> Result<Value> {
        if password.is_empty() || value.is_null() {
            return Ok(value.clone());
        }

        let mut sealed = 0usize;
        let out = try_map_fields(value, is_vault_field, |s| {
            if s.is_empty() || self.cipher.is_ciphertext(s) {
                return Ok(s.to_string());
            }
            sealed += 1;
            self.cipher.encrypt(s, password)
        })?;

        debug!(fields = sealed, "Encrypted vault fields");
        Ok(out)
    }

    /// Return a copy of `value` with every vault field decrypted under `password`.
    ///
    /// Never fails: a field that is not ciphertext, or that does not open with
    /// this password, keeps its stored value.
    pub fn decrypt(&self, value: &Value, password: &str) -> Value {
        if password.is_empty() || value.is_null() {
            return value.clone();
        }

        let mut kept = 0usize;
        let out = map_fields(value, is_vault_field, |s| {
            if !looks_like_base64(s) {
                return s.to_string();
            }
            match self.cipher.decrypt(s, password) {
                Ok(plain) => plain,
                Err(_) => {
                    kept += 1;
                    s.to_string()
                }
            }
        });

        if kept > 0 {
            debug!(fields = kept, "Vault fields left encrypted");
        }
        out
    }
}

impl Default for VaultFieldEncryptor {
    fn default() -> Self {
        Self::new(Arc::new(PasswordCipher::default()))
    }
}

impl std::fmt::Debug for VaultFieldEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultFieldEncryptor").finish_non_exhaustive()
    }
}
