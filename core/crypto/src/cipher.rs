//! Password-keyed string cipher.
//!
//! Ciphertexts are self-describing envelopes, standard-base64 encoded:
//!
//! ```text
//! "CFV" | version (1) | m_cost (u32 LE) | t_cost (u32 LE) | p_cost (u32 LE)
//!       | salt (32) | nonce (24) | ciphertext || tag (16)
//! ```
//!
//! The KDF parameters travel with the ciphertext, so a value sealed with one
//! preset still opens under a cipher configured with another.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::aead::{self, NONCE_SIZE, TAG_SIZE};
use crate::kdf::{derive_key, KdfParams};
use crate::keys::{Salt, SALT_LENGTH};
use cfgvault_common::{Error, Result};

const MAGIC: &[u8; 3] = b"CFV";
const ENVELOPE_VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 1 + 12 + SALT_LENGTH;
const MIN_ENVELOPE_LEN: usize = HEADER_LEN + NONCE_SIZE + TAG_SIZE;

/// Contract for sealing strings under a password.
///
/// Implementations must fail `decrypt` on any authentication or integrity
/// failure instead of returning garbage.
pub trait CipherProvider: Send + Sync {
    /// Encrypt `plaintext` with a key derived from `password`.
    fn encrypt(&self, plaintext: &str, password: &str) -> Result<String>;

    /// Decrypt a value produced by [`CipherProvider::encrypt`].
    ///
    /// # Errors
    /// - `Error::Crypto` when the password is wrong or the ciphertext is corrupt
    fn decrypt(&self, ciphertext: &str, password: &str) -> Result<String>;

    /// Whether `value` is structurally one of this provider's ciphertexts.
    ///
    /// Used to keep encryption idempotent. Providers without a recognisable
    /// format keep the default and report `false`.
    fn is_ciphertext(&self, _value: &str) -> bool {
        false
    }
}

/// Argon2id + XChaCha20-Poly1305 implementation of [`CipherProvider`].
#[derive(Debug, Clone, Default)]
pub struct PasswordCipher {
    params: KdfParams,
}

impl PasswordCipher {
    /// Create a cipher that derives keys with the default (interactive) preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cipher that seals new values with `params`.
    pub fn with_params(params: KdfParams) -> Self {
        Self { params }
    }

    /// KDF parameters used for new ciphertexts.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl CipherProvider for PasswordCipher {
    fn encrypt(&self, plaintext: &str, password: &str) -> Result<String> {
        let salt = Salt::generate();
        let key = derive_key(password.as_bytes(), &salt, &self.params)?;
        let sealed = aead::encrypt(key.as_bytes(), plaintext.as_bytes())?;

        let mut envelope = Vec::with_capacity(HEADER_LEN + sealed.len());
        envelope.extend_from_slice(MAGIC);
        envelope.push(ENVELOPE_VERSION);
        envelope.extend_from_slice(&self.params.memory_cost.to_le_bytes());
        envelope.extend_from_slice(&self.params.time_cost.to_le_bytes());
        envelope.extend_from_slice(&self.params.parallelism.to_le_bytes());
        envelope.extend_from_slice(salt.as_bytes());
        envelope.extend_from_slice(&sealed);

        Ok(STANDARD.encode(envelope))
    }

    fn decrypt(&self, ciphertext: &str, password: &str) -> Result<String> {
        let envelope = STANDARD
            .decode(ciphertext)
            .map_err(|_| Error::Crypto("Ciphertext is not valid base64".to_string()))?;
        let (params, salt, sealed) = parse_envelope(&envelope)?;

        let key = derive_key(password.as_bytes(), &salt, &params)?;
        let plaintext = aead::decrypt(key.as_bytes(), sealed)?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Crypto("Decrypted value is not valid UTF-8".to_string()))
    }

    fn is_ciphertext(&self, value: &str) -> bool {
        match STANDARD.decode(value) {
            Ok(envelope) => parse_envelope(&envelope).is_ok(),
            Err(_) => false,
        }
    }
}

fn parse_envelope(envelope: &[u8]) -> Result<(KdfParams, Salt, &[u8])> {
    if envelope.len() < MIN_ENVELOPE_LEN {
        return Err(Error::Crypto("Ciphertext too short".to_string()));
    }
    if &envelope[..MAGIC.len()] != MAGIC {
        return Err(Error::Crypto("Unrecognised ciphertext format".to_string()));
    }
    let version = envelope[MAGIC.len()];
    if version != ENVELOPE_VERSION {
        return Err(Error::Crypto(format!(
            "Unsupported ciphertext version {}",
            version
        )));
    }

    let mut offset = MAGIC.len() + 1;
    let mut read_u32 = || {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&envelope[offset..offset + 4]);
        offset += 4;
        u32::from_le_bytes(bytes)
    };
    let params = KdfParams {
        memory_cost: read_u32(),
        time_cost: read_u32(),
        parallelism: read_u32(),
    };
    params.validate()?;

    let salt_start = HEADER_LEN - SALT_LENGTH;
    let salt = Salt::from_slice(&envelope[salt_start..HEADER_LEN])
        .ok_or_else(|| Error::Crypto("Invalid salt length".to_string()))?;

    Ok((params, salt, &envelope[HEADER_LEN..]))
}
