//! Cryptographic primitives for cfgvault.
//!
//! This module provides:
//! - Key derivation using Argon2id
//! - Authenticated encryption using XChaCha20-Poly1305
//! - The password-keyed [`CipherProvider`] used to seal vault fields
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Every ciphertext carries its own salt and nonce

pub mod aead;
pub mod cipher;
pub mod kdf;
pub mod keys;

pub use aead::{decrypt, encrypt};
pub use cipher::{CipherProvider, PasswordCipher};
pub use kdf::{derive_key, KdfParams, MAX_MEMORY_COST, MAX_PARALLELISM, MAX_TIME_COST};
pub use keys::{DerivedKey, Salt, KEY_LENGTH, SALT_LENGTH};
