//! Master password resolution.

use async_trait::async_trait;
use std::io::IsTerminal;
use tracing::debug;

use cfgvault_common::{Error, Result};
use cfgvault_vault::MasterPassword;

/// Source of the master password when a migration needs one and the caller
/// did not pass it explicitly.
#[async_trait]
pub trait MasterPasswordResolver: Send + Sync {
    /// Resolve the password for `document`, or `None` if none is available.
    async fn resolve(&self, document: &str) -> Result<Option<MasterPassword>>;
}

/// Resolver that always answers with the same password.
pub struct StaticPasswordResolver {
    password: MasterPassword,
}

impl StaticPasswordResolver {
    /// Create a resolver for `password`.
    pub fn new(password: MasterPassword) -> Self {
        Self { password }
    }
}

#[async_trait]
impl MasterPasswordResolver for StaticPasswordResolver {
    async fn resolve(&self, _document: &str) -> Result<Option<MasterPassword>> {
        Ok(Some(self.password.clone()))
    }
}

/// Resolver for non-interactive use; never has a password.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPasswordResolver;

#[async_trait]
impl MasterPasswordResolver for NoPasswordResolver {
    async fn resolve(&self, _document: &str) -> Result<Option<MasterPassword>> {
        Ok(None)
    }
}

/// Environment variable read by [`EnvPasswordResolver`].
pub const MASTER_PASSWORD_ENV: &str = "CFGVAULT_MASTER_PASSWORD";

/// Resolver for headless runs that reads `CFGVAULT_MASTER_PASSWORD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvPasswordResolver;

#[async_trait]
impl MasterPasswordResolver for EnvPasswordResolver {
    async fn resolve(&self, _document: &str) -> Result<Option<MasterPassword>> {
        match std::env::var(MASTER_PASSWORD_ENV) {
            Ok(value) if !value.is_empty() => MasterPassword::new(value).map(Some),
            _ => Ok(None),
        }
    }
}

/// Resolver that asks on the terminal without echo.
///
/// Answers `None` when stdin is not a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptPasswordResolver;

#[async_trait]
impl MasterPasswordResolver for PromptPasswordResolver {
    async fn resolve(&self, document: &str) -> Result<Option<MasterPassword>> {
        if !std::io::stdin().is_terminal() {
            debug!(document, "No terminal for master password prompt");
            return Ok(None);
        }
        let prompt = format!("Master password for '{}': ", document);
        let entered = tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt))
            .await
            .map_err(|e| Error::Validation(format!("Password prompt failed: {}", e)))??;

        if entered.is_empty() {
            debug!(document, "No master password entered");
            return Ok(None);
        }
        MasterPassword::new(entered).map(Some)
    }
}
