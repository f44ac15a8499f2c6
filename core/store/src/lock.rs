//! Per-document file locks.
//!
//! A lock is a `<name>.json.lock` file created with exclusive-create. Its
//! first line is an owner token (pid and a random id). Other processes, other
//! store instances and other tasks wait for it with a fixed backoff.
//!
//! The holder touches the file every third of the staleness threshold. A lock
//! file older than the threshold is left over from a crashed writer and is
//! reclaimed by renaming it aside first, so two waiters never both delete it.
//! On release the file is removed only while it still carries the holder's
//! token.
//!
//! Within one task the lock is re-entrant: a nested acquisition of a lock the
//! task already holds only bumps a depth counter. The counter is task-local,
//! so a spawned task never inherits its parent's locks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::settings::LockSettings;
use cfgvault_common::{Error, Result};

tokio::task_local! {
    static HELD_LOCKS: RefCell<HashMap<PathBuf, usize>>;
}

/// Run `fut` while holding the lock at `lock_path`.
///
/// The lock is released when `fut` completes, fails or is dropped.
///
/// # Errors
/// - `Error::Conflict` if the lock is still held after every attempt
/// - `Error::Io` if the lock file cannot be created for another reason
pub async fn with_lock<F, T>(lock_path: &Path, settings: &LockSettings, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let depth = HELD_LOCKS
        .try_with(|held| held.borrow().get(lock_path).copied().unwrap_or(0))
        .ok();

    let file = match depth {
        Some(depth) if depth > 0 => {
            debug!(lock = %lock_path.display(), depth = depth + 1, "Re-entering held lock");
            None
        }
        _ => Some(LockFile::acquire(lock_path, settings).await?),
    };

    let held = async move {
        let _file = file;
        let _depth = DepthGuard::enter(lock_path);
        fut.await
    };

    match depth {
        Some(_) => held.await,
        None => HELD_LOCKS.scope(RefCell::new(HashMap::new()), held).await,
    }
}

/// Whether the current task holds the lock at `lock_path`.
pub fn is_held(lock_path: &Path) -> bool {
    HELD_LOCKS
        .try_with(|held| held.borrow().get(lock_path).copied().unwrap_or(0) > 0)
        .unwrap_or(false)
}

/// Depth counter entry, decremented on drop.
struct DepthGuard {
    path: PathBuf,
}

impl DepthGuard {
    fn enter(path: &Path) -> Self {
        let _ = HELD_LOCKS.try_with(|held| {
            *held.borrow_mut().entry(path.to_path_buf()).or_insert(0) += 1;
        });
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        let _ = HELD_LOCKS.try_with(|held| {
            let mut held = held.borrow_mut();
            if let Some(depth) = held.get_mut(&self.path) {
                *depth -= 1;
                if *depth == 0 {
                    held.remove(&self.path);
                }
            }
        });
    }
}

/// An acquired lock file, kept fresh while alive and removed on drop.
struct LockFile {
    path: PathBuf,
    token: String,
    heartbeat: JoinHandle<()>,
}

impl LockFile {
    async fn acquire(path: &Path, settings: &LockSettings) -> Result<Self> {
        let token = format!("{}:{}", std::process::id(), Uuid::new_v4());

        for attempt in 1..=settings.max_attempts {
            match create_lock_file(path, &token).await {
                Ok(()) => {
                    debug!(lock = %path.display(), attempt, "Acquired lock");
                    let heartbeat = spawn_heartbeat(
                        path.to_path_buf(),
                        token.clone(),
                        settings.refresh_interval(),
                    );
                    return Ok(Self {
                        path: path.to_path_buf(),
                        token,
                        heartbeat,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(path, settings).await && reclaim_stale(path, settings).await? {
                        continue;
                    }
                    tokio::time::sleep(settings.retry_interval()).await;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Conflict(format!(
            "Could not acquire lock {} after {} attempts",
            path.display(),
            settings.max_attempts
        )))
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.heartbeat.abort();
        match std::fs::read_to_string(&self.path) {
            Ok(text) if owner_token(&text) == Some(self.token.as_str()) => {
                match std::fs::remove_file(&self.path) {
                    Ok(()) => debug!(lock = %self.path.display(), "Released lock"),
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(lock = %self.path.display(), error = %e, "Failed to remove lock file")
                    }
                }
            }
            Ok(_) => warn!(lock = %self.path.display(), "Lock was taken over, leaving it in place"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(lock = %self.path.display(), error = %e, "Failed to read lock file"),
        }
    }
}

fn owner_token(contents: &str) -> Option<&str> {
    contents.lines().next()
}

async fn create_lock_file(path: &Path, token: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    let owner = format!("{}\n{}\n", token, Utc::now().to_rfc3339());
    file.write_all(owner.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Touch the lock file on a fixed interval until aborted or taken over.
fn spawn_heartbeat(path: PathBuf, token: String, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match refresh(&path, &token).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(lock = %path.display(), "Lock no longer ours, stopping refresh");
                    break;
                }
                Err(e) => warn!(lock = %path.display(), error = %e, "Failed to refresh lock"),
            }
        }
    })
}

async fn refresh(path: &Path, token: &str) -> std::io::Result<bool> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if owner_token(&contents) != Some(token) {
        return Ok(false);
    }

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new()
            .write(true)
            .open(&path)?
            .set_modified(SystemTime::now())
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(true)
}

/// Move a stale lock aside and drop it.
///
/// Returns `false` when the file turned out to be live, in which case it is
/// put back unless a new lock already took its place.
async fn reclaim_stale(path: &Path, settings: &LockSettings) -> Result<bool> {
    let mut aside = OsString::from(path.as_os_str());
    aside.push(format!(".{}.stale", Uuid::new_v4().simple()));
    let aside = PathBuf::from(aside);

    match fs::rename(path, &aside).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    }

    let reclaimed = is_stale(&aside, settings).await;
    if reclaimed {
        warn!(lock = %path.display(), "Reclaimed stale lock");
    } else {
        match fs::hard_link(&aside, path).await {
            Ok(()) => debug!(lock = %path.display(), "Restored live lock moved during reclaim"),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => warn!(lock = %path.display(), error = %e, "Failed to restore live lock"),
        }
    }

    if let Err(e) = fs::remove_file(&aside).await {
        warn!(lock = %aside.display(), error = %e, "Failed to remove reclaimed lock");
    }
    Ok(reclaimed)
}

async fn is_stale(path: &Path, settings: &LockSettings) -> bool {
    let modified = match fs::metadata(path).await.and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return false,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > settings.stale_after())
        .unwrap_or(false)
}
