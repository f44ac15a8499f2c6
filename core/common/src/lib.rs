//! Common utilities and types shared across the cfgvault crates.
//!
//! This module provides the error taxonomy every layer reports through,
//! plus the small value types that cross crate boundaries.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{ObjectKey, SensitiveString};
