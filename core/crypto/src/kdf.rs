//! Argon2id key derivation for vault field ciphertexts.
//!
//! The cost parameters of every ciphertext are stored in its envelope, so
//! anything read back from a document or an object store is bounded by
//! [`KdfParams::validate`] before a key is derived.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::keys::{DerivedKey, Salt, KEY_LENGTH};
use cfgvault_common::{Error, Result};

/// Largest memory cost accepted, in KiB (1 GiB).
pub const MAX_MEMORY_COST: u32 = 1024 * 1024;

/// Largest number of Argon2 passes accepted.
pub const MAX_TIME_COST: u32 = 16;

/// Largest degree of parallelism accepted.
pub const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of passes.
    pub time_cost: u32,
    /// Lanes.
    pub parallelism: u32,
}

impl KdfParams {
    /// 64 MiB, 3 passes, 4 lanes. Used for new ciphertexts by default.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 64 * 1024,
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// 256 MiB, 4 passes, 4 lanes.
    pub fn sensitive() -> Self {
        Self {
            memory_cost: 256 * 1024,
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// 32 MiB, 3 passes, 2 lanes, for small machines.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 32 * 1024,
            time_cost: 3,
            parallelism: 2,
        }
    }

    /// Smallest parameters Argon2id accepts.
    ///
    /// Only for tests and throwaway data: a document with many vault fields
    /// derives one key per field.
    pub fn minimal() -> Self {
        Self {
            memory_cost: 64,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Reject costs outside the accepted bounds.
    ///
    /// # Errors
    /// - `Error::Crypto` if a cost is zero or above its maximum
    pub fn validate(&self) -> Result<()> {
        if self.time_cost == 0 || self.parallelism == 0 {
            return Err(Error::Crypto("KDF costs must be non-zero".to_string()));
        }
        if self.memory_cost > MAX_MEMORY_COST {
            return Err(Error::Crypto(format!(
                "KDF memory cost {} KiB exceeds limit of {} KiB",
                self.memory_cost, MAX_MEMORY_COST
            )));
        }
        if self.time_cost > MAX_TIME_COST {
            return Err(Error::Crypto(format!(
                "KDF time cost {} exceeds limit of {}",
                self.time_cost, MAX_TIME_COST
            )));
        }
        if self.parallelism > MAX_PARALLELISM {
            return Err(Error::Crypto(format!(
                "KDF parallelism {} exceeds limit of {}",
                self.parallelism, MAX_PARALLELISM
            )));
        }
        Ok(())
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Derive the key for one ciphertext from `password` and its `salt`.
///
/// # Errors
/// - `Error::Validation` if `password` is empty
/// - `Error::Crypto` if `params` are out of bounds or Argon2 fails
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(Error::Validation("Password cannot be empty".to_string()));
    }
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_cost,
        params.time_cost,
        params.parallelism,
        Some(KEY_LENGTH),
    )
    .map_err(|e| Error::Crypto(format!("Invalid KDF parameters: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key_bytes = [0u8; KEY_LENGTH];
    argon2
        .hash_password_into(password, salt.as_bytes(), &mut key_bytes)
        .map_err(|e| Error::Crypto(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey::from_bytes(key_bytes))
}
