//! Vault-field encryption for cfgvault documents.
//!
//! This module provides:
//! - A generic walker over `serde_json::Value` trees
//! - Selective encryption of "vault" fields, leaving the rest of a document readable
//! - Master password verification against a stored verifier
//!
//! # Vault fields
//! Any object key containing `vault` (case-insensitive) whose value is a
//! non-empty string, at any depth. Classification is structural and is
//! recomputed on every traversal.

pub mod encryptor;
pub mod password;
pub mod walk;

pub use encryptor::{has_vault_fields, is_vault_field, VaultFieldEncryptor};
pub use password::{seal_verifier, verify_master_password, MasterPassword};
pub use walk::{map_fields, try_map_fields};
