//! Versioned document store on the local filesystem.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::lock::with_lock;
use crate::settings::StoreSettings;
use cfgvault_common::{Error, Result};

/// Names of system files that share the directory but are not documents.
const RESERVED_NAMES: &[&str] = &["api-token", "update-state", "telemetry"];

const MAX_NAME_LENGTH: usize = 128;

/// Check a document name before it becomes part of a path.
///
/// # Errors
/// - `Error::Validation` if the name is empty, too long, starts with `.` or
///   contains anything other than ASCII letters, digits, `.`, `_` and `-`
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Document name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::Validation(format!(
            "Document name exceeds {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if name.starts_with('.') {
        return Err(Error::Validation(
            "Document name cannot start with '.'".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(Error::Validation(format!(
            "Document name '{}' contains invalid characters",
            name
        )));
    }
    Ok(())
}

/// Store of named JSON documents in one directory.
///
/// Construct one store per directory. Each instance keeps its own cache of
/// loaded documents; the cache is never trusted for updates, which always
/// reload from disk under the document lock.
pub struct ConfigFileStore {
    settings: StoreSettings,
    cache: RwLock<HashMap<String, Document>>,
}

impl ConfigFileStore {
    /// Create a store with the given settings.
    ///
    /// Nothing is touched on disk until the first write.
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            settings,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store for `dir` with default settings otherwise.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::new(StoreSettings::default().with_dir(dir))
    }

    /// Get the settings.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Get the document directory.
    pub fn dir(&self) -> &Path {
        &self.settings.dir
    }

    /// Get the reserved default document name.
    pub fn default_name(&self) -> &str {
        &self.settings.default_name
    }

    /// Path of the document file for `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.settings.dir.join(format!("{}.json", name)))
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.settings.dir.join(format!("{}.json.bak", name))
    }

    fn lock_path(&self, name: &str) -> PathBuf {
        self.settings.dir.join(format!("{}.json.lock", name))
    }

    async fn ensure_dir(&self) -> Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&self.settings.dir).await?;
        Ok(())
    }

    /// Run `fut` while holding the lock for `name`.
    ///
    /// Store operations called from inside `fut` on the same task re-enter
    /// the lock instead of waiting for it.
    pub fn locked<'a, F, T>(
        &'a self,
        name: &'a str,
        fut: F,
    ) -> impl Future<Output = Result<T>> + 'a
    where
        F: Future<Output = Result<T>> + 'a,
        T: 'a,
    {
        // Store operations nest several levels deep; keep each level's state
        // on the heap instead of inlined into its caller.
        let fut = Box::pin(fut);
        async move {
            validate_name(name)?;
            self.ensure_dir().await?;
            with_lock(&self.lock_path(name), &self.settings.lock, fut).await
        }
    }

    /// Load a document.
    ///
    /// A missing file yields an empty document at version 0, which is not cached.
    ///
    /// # Errors
    /// - `Error::Serialization` if the file is not a valid document
    pub async fn load(&self, name: &str) -> Result<Document> {
        let path = self.path_for(name)?;

        if let Some(doc) = self.cache.read().await.get(name) {
            debug!(name, "Document cache hit");
            return Ok(doc.clone());
        }

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(name, "Document not found, using empty document");
                return Ok(Document::empty());
            }
            Err(e) => return Err(e.into()),
        };

        let doc: Document = serde_json::from_str(&text).map_err(|e| {
            Error::Serialization(format!("Failed to parse document '{}': {}", name, e))
        })?;
        self.cache.write().await.insert(name.to_string(), doc.clone());
        Ok(doc)
    }

    /// Persist `document` as `name` and return what was written.
    ///
    /// The stored version is always `document.version + 1`. The previous file,
    /// if any, is copied to the backup first.
    pub async fn save(&self, document: Document, name: &str) -> Result<Document> {
        self.locked(name, async {
            let path = self.path_for(name)?;
            let mut persisted = document;
            persisted.version = persisted.version.checked_add(1).ok_or_else(|| {
                Error::Validation(format!("Document '{}' version overflow", name))
            })?;

            match fs::copy(&path, self.backup_path(name)).await {
                Ok(_) => debug!(name, "Backed up previous document"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }

            self.write_document(&path, &persisted).await?;
            self.cache
                .write()
                .await
                .insert(name.to_string(), persisted.clone());

            info!(name, version = persisted.version, "Saved document");
            Ok(persisted)
        })
        .await
    }

    /// Reload `name` from disk under its lock, apply `updater` and save.
    ///
    /// Returns the document as persisted.
    pub async fn update<U>(&self, name: &str, updater: U) -> Result<Document>
    where
        U: FnOnce(&mut Document),
    {
        self.try_update(name, |doc| {
            updater(doc);
            Ok(())
        })
        .await
    }

    /// Like [`ConfigFileStore::update`], but an updater error aborts without writing.
    pub async fn try_update<U>(&self, name: &str, updater: U) -> Result<Document>
    where
        U: FnOnce(&mut Document) -> Result<()>,
    {
        self.locked(name, async {
            self.invalidate(name).await;
            let mut doc = self.load(name).await?;
            updater(&mut doc)?;
            self.save(doc, name).await
        })
        .await
    }

    /// Create a new document at version 1.
    ///
    /// # Errors
    /// - `Error::Conflict` if a document with this name exists
    pub async fn init(&self, name: &str) -> Result<Document> {
        self.locked(name, async {
            let path = self.path_for(name)?;
            if fs::try_exists(&path).await? {
                return Err(Error::Conflict(format!("Document '{}' already exists", name)));
            }

            let mut doc = Document::empty();
            doc.version = 1;
            self.write_document(&path, &doc).await?;
            self.cache.write().await.insert(name.to_string(), doc.clone());

            info!(name, "Initialized document");
            Ok(doc)
        })
        .await
    }

    /// Delete a document and its backup.
    ///
    /// # Errors
    /// - `Error::Validation` for the default document
    /// - `Error::NotFound` if the document does not exist
    pub async fn delete(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if name == self.settings.default_name {
            return Err(Error::Validation(format!(
                "Cannot delete the default document '{}'",
                name
            )));
        }

        self.locked(name, async {
            let path = self.path_for(name)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(Error::NotFound(format!("Document '{}' not found", name)));
                }
                Err(e) => return Err(e.into()),
            }
            match fs::remove_file(self.backup_path(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(name, error = %e, "Failed to remove backup"),
            }
            self.invalidate(name).await;

            info!(name, "Deleted document");
            Ok(())
        })
        .await
    }

    /// Restore a document from its backup.
    ///
    /// Returns `None` when there is no backup.
    ///
    /// # Errors
    /// - `Error::Serialization` if the backup is not a valid document
    pub async fn recover(&self, name: &str) -> Result<Option<Document>> {
        self.locked(name, async {
            let path = self.path_for(name)?;
            let backup = match fs::read(self.backup_path(name)).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            };

            serde_json::from_slice::<Document>(&backup).map_err(|e| {
                Error::Serialization(format!("Backup of '{}' is corrupt: {}", name, e))
            })?;
            self.write_atomic(&path, &backup).await?;
            self.invalidate(name).await;

            let doc = self.load(name).await?;
            info!(name, version = doc.version, "Recovered document from backup");
            Ok(Some(doc))
        })
        .await
    }

    /// List document names, sorted, without system files.
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.settings.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|f| f.strip_suffix(".json")) else {
                continue;
            };
            if RESERVED_NAMES.contains(&name) || validate_name(name).is_err() {
                continue;
            }
            names.push(name.to_string());
        }

        names.sort();
        Ok(names)
    }

    /// Whether a document file exists for `name`.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(name)?).await?)
    }

    /// Load the default document, creating it on first access.
    pub async fn get_or_create_default(&self) -> Result<Document> {
        let name = self.settings.default_name.clone();
        if self.exists(&name).await? {
            return self.load(&name).await;
        }
        match self.init(&name).await {
            Ok(doc) => Ok(doc),
            Err(Error::Conflict(_)) => self.load(&name).await,
            Err(e) => Err(e),
        }
    }

    /// Drop `name` from this instance's cache.
    pub async fn invalidate(&self, name: &str) {
        self.cache.write().await.remove(name);
    }

    async fn write_document(&self, path: &Path, doc: &Document) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(doc)?;
        bytes.push(b'\n');
        self.write_atomic(path, &bytes).await
    }

    /// Write `bytes` to a sibling temp file, fsync it and rename it over `path`.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| Error::Validation(format!("Invalid path {}", path.display())))?;
        let tmp = path.with_file_name(format!(
            "{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            Utc::now().timestamp_millis()
        ));

        let result = async {
            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            options.mode(0o600);

            let mut file = options.open(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(tmp = %tmp.display(), error = %cleanup, "Failed to remove temp file");
                }
            }
            return Err(e.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Mode;
    use crate::settings::LockSettings;
    use serde_json::{json, Map};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> ConfigFileStore {
        ConfigFileStore::open(temp.path())
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("rediacc").is_ok());
        assert!(validate_name("prod-eu_1.v2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("../escape").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name(&"x".repeat(129)).is_err());
    }

    #[tokio::test]
    async fn test_init_on_empty_directory() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let doc = store.init("rediacc").await.unwrap();

        assert_eq!(doc.version, 1);
        assert!(!doc.id.is_empty());
        assert!(temp.path().join("rediacc.json").exists());
        assert!(!temp.path().join("rediacc.json.bak").exists());
        assert!(!temp.path().join("rediacc.json.lock").exists());
    }

    #[tokio::test]
    async fn test_init_existing_conflicts() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();

        assert!(matches!(store.init("rediacc").await, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_bumps_version_and_backs_up() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let initial = store.init("rediacc").await.unwrap();

        let saved = store.save(initial.clone(), "rediacc").await.unwrap();
        assert_eq!(saved.version, 2);

        let on_disk: Document = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join("rediacc.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(on_disk.version, 2);

        let backup: Document = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join("rediacc.json.bak")).unwrap(),
        )
        .unwrap();
        assert_eq!(backup, initial);
    }

    #[tokio::test]
    async fn test_version_ignores_caller_value() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let mut doc = store.init("rediacc").await.unwrap();

        for _ in 0..5 {
            doc = store.save(doc, "rediacc").await.unwrap();
        }
        assert_eq!(doc.version, 6);

        doc.version = 100;
        let saved = store.save(doc, "rediacc").await.unwrap();
        assert_eq!(saved.version, 101);
    }

    #[tokio::test]
    async fn test_load_missing_returns_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let doc = store.load("nothing").await.unwrap();
        assert_eq!(doc.version, 0);
        assert_eq!(doc.mode, Mode::Local);
        assert!(!temp.path().join("nothing.json").exists());
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_document() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.json"), "{not json").unwrap();

        assert!(matches!(
            store(&temp).load("broken").await,
            Err(Error::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_update_reloads_from_disk() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();
        store.load("rediacc").await.unwrap();

        // Another writer changes the file behind this instance's cache.
        let other = ConfigFileStore::open(temp.path());
        other
            .update("rediacc", |doc| {
                doc.extra.insert("team".to_string(), json!("ops"));
            })
            .await
            .unwrap();

        let updated = store
            .update("rediacc", |doc| {
                doc.extra.insert("region".to_string(), json!("eu"));
            })
            .await
            .unwrap();

        assert_eq!(updated.version, 3);
        assert_eq!(updated.extra["team"], json!("ops"));
        assert_eq!(updated.extra["region"], json!("eu"));
    }

    #[tokio::test]
    async fn test_try_update_error_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();

        let result = store
            .try_update("rediacc", |doc| {
                doc.machines = Some(Map::new());
                Err(Error::Validation("nope".to_string()))
            })
            .await;

        assert!(result.is_err());
        let doc = store.load("rediacc").await.unwrap();
        assert_eq!(doc.version, 1);
        assert!(doc.machines.is_none());
        assert!(!temp.path().join("rediacc.json.lock").exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_serialize() {
        let temp = TempDir::new().unwrap();
        let settings = StoreSettings::default().with_dir(temp.path()).with_lock(
            LockSettings::default().with_retry_interval(Duration::from_millis(10)),
        );
        let initial = ConfigFileStore::new(settings.clone())
            .init("rediacc")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..2 {
            let store = Arc::new(ConfigFileStore::new(settings.clone()));
            handles.push(tokio::spawn(async move {
                store
                    .update("rediacc", move |doc| {
                        let count = doc.extra.get("count").and_then(|v| v.as_u64()).unwrap_or(0);
                        doc.extra.insert("count".to_string(), json!(count + 1));
                        doc.extra.insert(format!("writer{}", i), json!(true));
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let final_doc = ConfigFileStore::new(settings).load("rediacc").await.unwrap();
        assert_eq!(final_doc.version, initial.version + 2);
        assert_eq!(final_doc.extra["count"], json!(2));
        assert_eq!(final_doc.extra["writer0"], json!(true));
        assert_eq!(final_doc.extra["writer1"], json!(true));
    }

    #[tokio::test]
    async fn test_second_writer_waits_for_lock() {
        let temp = TempDir::new().unwrap();
        let settings = StoreSettings::default().with_dir(temp.path()).with_lock(
            LockSettings::default().with_retry_interval(Duration::from_millis(5)),
        );
        let first = Arc::new(ConfigFileStore::new(settings.clone()));
        first.init("rediacc").await.unwrap();

        let (held_tx, held_rx) = tokio::sync::oneshot::channel();
        let holder = {
            let first = Arc::clone(&first);
            tokio::spawn(async move {
                first
                    .locked("rediacc", async {
                        let _ = held_tx.send(());
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        first
                            .update("rediacc", |doc| {
                                doc.extra.insert("first".to_string(), json!(true));
                            })
                            .await
                    })
                    .await
            })
        };

        held_rx.await.unwrap();
        let second = ConfigFileStore::new(settings);
        let doc = second
            .update("rediacc", |doc| {
                doc.extra.insert("second".to_string(), json!(true));
            })
            .await
            .unwrap();

        holder.await.unwrap().unwrap();
        assert_eq!(doc.version, 3);
        assert_eq!(doc.extra["first"], json!(true));
    }

    #[tokio::test]
    async fn test_nested_operations_keep_small_futures() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();

        let update = store.update("rediacc", |doc| {
            doc.extra.insert("touched".to_string(), json!(true));
        });
        assert!(std::mem::size_of_val(&update) < 16 * 1024);

        let nested = store.locked("rediacc", async {
            store
                .try_update("rediacc", |doc| {
                    doc.extra.insert("nested".to_string(), json!(true));
                    Ok(())
                })
                .await
        });
        assert!(std::mem::size_of_val(&nested) < 16 * 1024);

        update.await.unwrap();
        let doc = nested.await.unwrap();
        assert_eq!(doc.version, 3);
        assert_eq!(doc.extra["touched"], json!(true));
    }

    #[tokio::test]
    async fn test_delete() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let doc = store.init("staging").await.unwrap();
        store.save(doc, "staging").await.unwrap();
        assert!(temp.path().join("staging.json.bak").exists());

        store.delete("staging").await.unwrap();

        assert!(!temp.path().join("staging.json").exists());
        assert!(!temp.path().join("staging.json.bak").exists());
        assert!(!temp.path().join("staging.json.lock").exists());
        assert!(!store.exists("staging").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_default_forbidden() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();

        assert!(matches!(
            store.delete("rediacc").await,
            Err(Error::Validation(_))
        ));
        assert!(store.exists("rediacc").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            store(&temp).delete("ghost").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recover_from_backup() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let v1 = store.init("rediacc").await.unwrap();
        let mut v2 = v1.clone();
        v2.extra.insert("broken".to_string(), json!(true));
        store.save(v2, "rediacc").await.unwrap();

        let recovered = store.recover("rediacc").await.unwrap().unwrap();

        assert_eq!(recovered, v1);
        assert_eq!(store.load("rediacc").await.unwrap(), v1);
    }

    #[tokio::test]
    async fn test_recover_without_backup() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.init("rediacc").await.unwrap();

        assert!(store.recover("rediacc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_skips_system_files() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        assert!(store.list().await.unwrap().is_empty());

        store.init("zeta").await.unwrap();
        let doc = store.init("alpha").await.unwrap();
        store.save(doc, "alpha").await.unwrap();
        for reserved in ["api-token", "update-state", "telemetry"] {
            std::fs::write(temp.path().join(format!("{}.json", reserved)), "{}").unwrap();
        }
        std::fs::write(temp.path().join("notes.txt"), "").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let temp = TempDir::new().unwrap();
        let store = ConfigFileStore::open(temp.path().join("absent"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_default() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let created = store.get_or_create_default().await.unwrap();
        assert_eq!(created.version, 1);

        let again = store.get_or_create_default().await.unwrap();
        assert_eq!(again.id, created.id);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let doc = store.init("rediacc").await.unwrap();
        store.save(doc, "rediacc").await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cfg");
        let store = ConfigFileStore::open(&dir);
        store.init("rediacc").await.unwrap();

        let file_mode = std::fs::metadata(dir.join("rediacc.json"))
            .unwrap()
            .permissions()
            .mode();
        let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(matches!(store.load("../x").await, Err(Error::Validation(_))));
        assert!(matches!(store.init(".x").await, Err(Error::Validation(_))));
    }
}
