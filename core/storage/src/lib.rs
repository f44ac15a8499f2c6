//! Object-store abstraction for cfgvault remote mode.
//!
//! This module provides a trait-based interface over the object stores a
//! document can be migrated to, and a registry that resolves a stored
//! [`RemoteConfig`] to a concrete store.
//!
//! # Design Principles
//! - Store isolation: no transport-specific logic in the store or migrator crates
//! - Async operations: all I/O operations are async
//! - Unified error semantics: missing objects are `Ok(None)`, transport failures are `Error::Remote`

pub mod config;
pub mod directory;
pub mod memory;
pub mod object_store;
pub mod registry;

pub use config::RemoteConfig;
pub use directory::DirectoryObjectStore;
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectStore, PrefixedStore};
pub use registry::{StoreFactory, StoreRegistry};
