//! XChaCha20-Poly1305 sealing of a single vault field.
//!
//! Each call draws a fresh 24-byte nonce from the OS and prepends it to the
//! output, so the same key never needs a nonce counter.

use chacha20poly1305::{
    aead::{generic_array::GenericArray, Aead, AeadCore, KeyInit, OsRng},
    XChaCha20Poly1305,
};

use crate::keys::KEY_LENGTH;
use cfgvault_common::{Error, Result};

/// XChaCha20 nonce length.
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag length.
pub const TAG_SIZE: usize = 16;

/// Seal `plaintext` under `key`, returning `nonce || ciphertext || tag`.
///
/// # Errors
/// - `Error::Crypto` if `key` is not `KEY_LENGTH` bytes
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);

    let sealed = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open output of [`encrypt`].
///
/// # Errors
/// - `Error::Crypto` on a bad key length, truncated input, a wrong key or
///   tampered bytes
pub fn decrypt(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    let cipher = cipher_for(key)?;
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::Crypto("Ciphertext too short".to_string()));
    }

    let (nonce, body) = sealed.split_at(NONCE_SIZE);
    cipher
        .decrypt(GenericArray::from_slice(nonce), body)
        .map_err(|e| Error::Crypto(format!("Decryption failed: {}", e)))
}

fn cipher_for(key: &[u8]) -> Result<XChaCha20Poly1305> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "Invalid key length: expected {}, got {}",
            KEY_LENGTH,
            key.len()
        )));
    }
    Ok(XChaCha20Poly1305::new(GenericArray::from_slice(key)))
}
