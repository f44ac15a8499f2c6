//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CFGVAULT_CONFIG_DIR";

/// Name of the document created on first access.
pub const DEFAULT_DOCUMENT_NAME: &str = "rediacc";

/// File lock behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockSettings {
    /// Age in milliseconds after which a lock file is considered abandoned.
    pub stale_after_ms: u64,
    /// Number of acquisition attempts before giving up.
    pub max_attempts: u32,
    /// Fixed delay in milliseconds between attempts.
    pub retry_interval_ms: u64,
}

impl LockSettings {
    /// Set the staleness threshold.
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after_ms = stale_after.as_millis() as u64;
        self
    }

    /// Set the number of attempts.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay between attempts.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Staleness threshold.
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Delay between attempts.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// How often a held lock file is touched, a third of the staleness threshold.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis((self.stale_after_ms / 3).max(1))
    }
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            stale_after_ms: 45_000,
            max_attempts: 100,
            retry_interval_ms: 100,
        }
    }
}

/// Where documents live and how they are locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Directory holding the documents.
    pub dir: PathBuf,
    /// Reserved document name that cannot be deleted.
    pub default_name: String,
    /// Lock behaviour.
    #[serde(default)]
    pub lock: LockSettings,
}

impl StoreSettings {
    /// Default settings with the directory taken from `CFGVAULT_CONFIG_DIR` when set.
    pub fn from_env() -> Self {
        let settings = Self::default();
        match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => settings.with_dir(dir),
            _ => settings,
        }
    }

    /// Set the document directory.
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Set the default document name.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        self
    }

    /// Set the lock behaviour.
    pub fn with_lock(mut self, lock: LockSettings) -> Self {
        self.lock = lock;
        self
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            dir: base.join(".config").join("rediacc"),
            default_name: DEFAULT_DOCUMENT_NAME.to_string(),
            lock: LockSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StoreSettings::default();
        assert!(settings.dir.ends_with(".config/rediacc"));
        assert_eq!(settings.default_name, "rediacc");
        assert_eq!(settings.lock.stale_after(), Duration::from_secs(45));
        assert_eq!(settings.lock.max_attempts, 100);
        assert_eq!(settings.lock.retry_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_builders() {
        let settings = StoreSettings::default()
            .with_dir("/tmp/configs")
            .with_default_name("main")
            .with_lock(
                LockSettings::default()
                    .with_max_attempts(3)
                    .with_retry_interval(Duration::from_millis(5))
                    .with_stale_after(Duration::from_secs(1)),
            );

        assert_eq!(settings.dir, PathBuf::from("/tmp/configs"));
        assert_eq!(settings.default_name, "main");
        assert_eq!(settings.lock.max_attempts, 3);
        assert_eq!(settings.lock.retry_interval_ms, 5);
        assert_eq!(settings.lock.stale_after_ms, 1000);
    }

    #[test]
    fn test_from_env_honours_config_dir() {
        std::env::set_var(CONFIG_DIR_ENV, "/srv/cfgvault");
        assert_eq!(StoreSettings::from_env().dir, PathBuf::from("/srv/cfgvault"));

        std::env::set_var(CONFIG_DIR_ENV, "");
        assert_eq!(StoreSettings::from_env(), StoreSettings::default());

        std::env::remove_var(CONFIG_DIR_ENV);
        let settings = StoreSettings::from_env();
        assert_eq!(settings, StoreSettings::default());
        assert_eq!(settings.default_name, DEFAULT_DOCUMENT_NAME);
    }

    #[test]
    fn test_refresh_interval_is_a_third_of_stale() {
        let lock = LockSettings::default();
        assert_eq!(lock.refresh_interval(), Duration::from_secs(15));
        let tiny = lock.with_stale_after(Duration::from_millis(1));
        assert_eq!(tiny.refresh_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_serde_round_trip_uses_camel_case() {
        let settings = StoreSettings::default().with_dir("/srv/cfg");
        let value = serde_json::to_value(&settings).unwrap();

        assert_eq!(value["defaultName"], "rediacc");
        assert_eq!(value["lock"]["staleAfterMs"], 45_000);
        let back: StoreSettings = serde_json::from_value(value).unwrap();
        assert_eq!(back, settings);
    }
}
