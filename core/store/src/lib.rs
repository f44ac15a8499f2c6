//! File-backed document store for cfgvault.
//!
//! This module provides:
//! - Versioned JSON documents with a backup of the previous state
//! - Cross-process file locks with stale-lock reclaim and task-scoped re-entrancy
//! - Atomic temp-file-then-rename writes with owner-only permissions
//! - A vault-aware wrapper that keeps vault fields encrypted on disk
//!
//! # On-disk layout
//! ```text
//! <dir>/<name>.json        current document
//! <dir>/<name>.json.bak    previous document
//! <dir>/<name>.json.lock   held while a writer is active
//! ```

pub mod document;
pub mod lock;
pub mod settings;
pub mod store;
pub mod vaulted;

pub use document::{Document, Mode, SshKeyPaths};
pub use settings::{LockSettings, StoreSettings};
pub use store::ConfigFileStore;
pub use vaulted::VaultedStore;
