//! Mode migration for cfgvault documents.
//!
//! This module provides:
//! - Moving a document's working state from the document itself to an object store
//! - Pulling it back into a local document
//! - Master password resolution for migrations of encrypted documents
//!
//! # Remote layout
//! ```text
//! <prefix>/_meta.json   schema marker
//! <prefix>/state.json   inventories, vault fields encrypted
//! <prefix>/ssh/id       SSH private key
//! <prefix>/ssh/id.pub   SSH public key (optional)
//! ```
//!
//! A migration touches the document only after every remote or local
//! artifact it depends on has been written, so a failure leaves the document
//! in its original mode.

pub mod migrator;
pub mod password;
pub mod remote_state;
pub mod ssh;

pub use migrator::{LocalTarget, ModeMigrator, RemoteTarget};
pub use password::{
    EnvPasswordResolver, MasterPasswordResolver, NoPasswordResolver, PromptPasswordResolver,
    StaticPasswordResolver, MASTER_PASSWORD_ENV,
};
pub use remote_state::{RemoteMeta, RemoteState};
pub use ssh::SshKeyMaterial;
