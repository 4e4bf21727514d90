//! Flat-file session store
//!
//! One JSON file per session, named by the session key, directly inside the
//! cache directory. See the module docs of [`crate::cache`] for the
//! consistency model.

use super::key::{self, is_temp_name};
use super::{ExpiryPolicy, SessionCache, SweepReport};
use crate::clock::{Clock, SystemClock};
use crate::error::{BoxError, WebSessionError, WebSessionResult};
use crate::session::{AccountId, SessionVal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::FileTimes;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Hours after which a leftover temp file is treated as an abandoned write
pub const TEMP_GRACE_HOURS: i64 = 1;

/// What reading one entry file produced
enum ReadOutcome {
    Missing,
    Found(SessionVal),
    Corrupt(serde_json::Error),
    Unreadable(io::Error),
}

/// Whether a read counts as use of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Request-path lookup; refreshes the access time
    Touch,
    /// Enumeration or sweep; leaves the access time alone
    Peek,
}

/// Identity of the file behind a key; a `put` always yields a new one
#[derive(Debug, Clone, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    #[cfg(unix)]
    ino: u64,
}

impl FileStamp {
    fn of(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        Self {
            modified: meta.modified().ok(),
            #[cfg(unix)]
            ino: meta.ino(),
        }
    }
}

/// Session cache backed by a directory of files
pub struct FlatFileCache {
    dir: PathBuf,
    policy: ExpiryPolicy,
    clock: Arc<dyn Clock>,
}

impl FlatFileCache {
    /// Open the cache at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>, policy: ExpiryPolicy) -> WebSessionResult<Self> {
        Self::with_clock(dir, policy, Arc::new(SystemClock)).await
    }

    /// Open the cache with an explicit time source
    ///
    /// A directory created here is restricted to the current user. An
    /// existing one keeps its mode, since other instances may share it.
    pub async fn with_clock(
        dir: impl Into<PathBuf>,
        policy: ExpiryPolicy,
        clock: Arc<dyn Clock>,
    ) -> WebSessionResult<Self> {
        let dir = dir.into();
        let existed = fs::metadata(&dir).await.is_ok();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| WebSessionError::CacheDirCreate {
                path: dir.clone(),
                source: e,
            })?;

        // Session files carry XSRF tokens
        #[cfg(unix)]
        if !existed {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            if let Err(e) = fs::set_permissions(&dir, perms).await {
                warn!("Cannot restrict permissions on {}: {}", dir.display(), e);
            }
        }
        #[cfg(not(unix))]
        let _ = existed;

        debug!(policy = %policy, "Opened session cache at {}", dir.display());
        Ok(Self { dir, policy, clock })
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Active expiry policy
    pub fn policy(&self) -> ExpiryPolicy {
        self.policy
    }

    /// Return the cached session, or run `loader` on a miss
    ///
    /// The loaded value is not stored; call `put` if it should be. A loader
    /// failure is returned as [`WebSessionError::Loader`] and is not retried.
    pub async fn get_or_load<F, Fut, E>(&self, key: &str, loader: F) -> WebSessionResult<SessionVal>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SessionVal, E>>,
        E: Into<BoxError>,
    {
        if let Some(val) = self.get(key).await {
            return Ok(val);
        }
        loader().await.map_err(|e| WebSessionError::loader(key, e))
    }

    /// Keys of every readable session owned by `account`
    pub async fn keys_for_account(&self, account: AccountId) -> Vec<String> {
        let mut keys: Vec<String> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|(_, val)| val.account_id == account)
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys
    }

    /// Log `account` out everywhere, returning how many sessions were removed
    pub async fn invalidate_account(&self, account: AccountId) -> usize {
        let keys = self.keys_for_account(account).await;
        self.invalidate_keys(&keys).await;
        info!("Invalidated {} session(s) of account {}", keys.len(), account);
        keys.len()
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        match key::validate(key) {
            Ok(()) => Some(self.dir.join(key)),
            Err(e) => {
                warn!("Refusing cache key: {}", e);
                None
            }
        }
    }

    fn tracks_access(&self) -> bool {
        matches!(self.policy, ExpiryPolicy::LastAccess { .. })
    }

    async fn read_entry(&self, path: &Path, access: Access) -> ReadOutcome {
        let preserve = self.tracks_access() && access == Access::Peek;
        let (mut file, restore_to) = match open_entry(path, preserve).await {
            Ok(opened) => opened,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return ReadOutcome::Missing,
            Err(e) => return ReadOutcome::Unreadable(e),
        };

        let mut content = vec![];
        if let Err(e) = file.read_to_end(&mut content).await {
            return ReadOutcome::Unreadable(e);
        }

        let set_accessed = match access {
            Access::Touch if self.tracks_access() => Some(SystemTime::from(self.clock.now())),
            Access::Touch => None,
            Access::Peek => restore_to,
        };
        if let Some(at) = set_accessed {
            let file = file.into_std().await;
            if let Err(e) = file.set_times(FileTimes::new().set_accessed(at)) {
                debug!("Cannot set access time of {}: {}", path.display(), e);
            }
        }

        match serde_json::from_slice(&content) {
            Ok(val) => ReadOutcome::Found(val),
            Err(e) => ReadOutcome::Corrupt(e),
        }
    }

    /// Delete one file, returning whether this call removed it
    async fn delete_file(&self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                error!(
                    "Error trying to delete {} from {}: {}",
                    path.display(),
                    self.dir.display(),
                    e
                );
                false
            }
        }
    }

    /// Delete `path` only if it is still the file described by `stamp`
    ///
    /// A `put` from another instance between the check and the unlink can
    /// still be lost; the window is one metadata call wide.
    async fn delete_if_unchanged(&self, path: &Path, stamp: &FileStamp) -> bool {
        match fs::symlink_metadata(path).await {
            Ok(meta) if FileStamp::of(&meta) == *stamp => self.delete_file(path).await,
            Ok(_) => {
                debug!("{} was replaced during sweep, keeping it", path.display());
                false
            }
            Err(_) => false,
        }
    }

    async fn stamp(path: &Path) -> io::Result<FileStamp> {
        fs::symlink_metadata(path).await.map(|m| FileStamp::of(&m))
    }

    /// Regular files in the cache directory, split into `(keys, temp files)`
    ///
    /// Empty if the directory can't be listed.
    async fn list_files(&self) -> (Vec<String>, Vec<String>) {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list files in cache {}: {}", self.dir.display(), e);
                return (vec![], vec![]);
            }
        };

        let mut keys = vec![];
        let mut temps = vec![];
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Cannot traverse files in cache {}: {}", self.dir.display(), e);
                    break;
                }
            };

            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !entry.file_type().await.is_ok_and(|t| t.is_file()) {
                continue;
            }
            if is_temp_name(&name) {
                temps.push(name);
            } else {
                keys.push(name);
            }
        }
        (keys, temps)
    }

    /// Names of committed entry files
    async fn list_keys(&self) -> Vec<String> {
        self.list_files().await.0
    }

    async fn write_then_rename(temp: &Path, target: &Path, content: &[u8]) -> io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(temp).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(temp, target).await
    }

    /// Remove temp files left by writers that died before their rename
    async fn sweep_temp_files(&self, temps: Vec<String>, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::hours(TEMP_GRACE_HOURS);
        let mut removed = 0;

        for name in temps {
            let path = self.dir.join(&name);
            let modified = match fs::symlink_metadata(&path).await.and_then(|m| m.modified()) {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(_) => continue,
            };

            if modified < cutoff && self.delete_file(&path).await {
                debug!(file = %name, "Removed abandoned temp file");
                removed += 1;
            }
        }
        removed
    }

    async fn sweep_absolute(&self, keys: Vec<String>, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        for key in keys {
            report.scanned += 1;
            let path = self.dir.join(&key);

            // Taken before the read so a concurrent refresh is never mistaken for this file
            let stamp = match Self::stamp(&path).await {
                Ok(stamp) => stamp,
                Err(_) => continue,
            };

            match self.read_entry(&path, Access::Peek).await {
                ReadOutcome::Found(val) => {
                    if val.is_expired(now) && self.delete_if_unchanged(&path, &stamp).await {
                        debug!(key = %key, expires_at = %val.expires_at, "Swept expired session");
                        report.removed += 1;
                    }
                }
                ReadOutcome::Missing => {}
                // Left for `get` to purge; another release may still read it
                ReadOutcome::Corrupt(e) => {
                    debug!(key = %key, "Sweep skipping unreadable session: {}", e);
                    report.skipped += 1;
                }
                ReadOutcome::Unreadable(e) => {
                    warn!("Cannot read cache {}: {}", path.display(), e);
                    report.skipped += 1;
                }
            }
        }

        report
    }

    async fn sweep_last_access(
        &self,
        keys: Vec<String>,
        now: DateTime<Utc>,
        max_age: chrono::Duration,
    ) -> SweepReport {
        let cutoff = now - max_age;
        let mut report = SweepReport::default();

        for key in keys {
            report.scanned += 1;
            let path = self.dir.join(&key);

            let meta = match fs::symlink_metadata(&path).await {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    report.skipped += 1;
                    continue;
                }
            };
            let accessed = match meta.accessed() {
                Ok(accessed) => DateTime::<Utc>::from(accessed),
                Err(e) => {
                    warn!("Cannot read access time of {}: {}", path.display(), e);
                    report.skipped += 1;
                    continue;
                }
            };

            if accessed < cutoff && self.delete_if_unchanged(&path, &FileStamp::of(&meta)).await {
                debug!(key = %key, accessed = %accessed, "Swept idle session");
                report.removed += 1;
            }
        }

        report
    }
}

/// Open an entry for reading
///
/// With `preserve_atime`, the read must not count as an access: Linux opens
/// with `O_NOATIME`, which only the file owner may use. Otherwise the
/// current access time is returned so the caller can put it back.
async fn open_entry(path: &Path, preserve_atime: bool) -> io::Result<(fs::File, Option<SystemTime>)> {
    if !preserve_atime {
        return Ok((fs::File::open(path).await?, None));
    }

    #[cfg(target_os = "linux")]
    {
        let mut options = fs::OpenOptions::new();
        options.read(true).custom_flags(libc::O_NOATIME);
        match options.open(path).await {
            Ok(file) => return Ok((file, None)),
            Err(e) if e.raw_os_error() == Some(libc::EPERM) => {}
            Err(e) => return Err(e),
        }
    }

    let file = fs::File::open(path).await?;
    let accessed = file.metadata().await.ok().and_then(|m| m.accessed().ok());
    Ok((file, accessed))
}

#[async_trait]
impl SessionCache for FlatFileCache {
    async fn get(&self, key: &str) -> Option<SessionVal> {
        let path = self.entry_path(key)?;

        match self.read_entry(&path, Access::Touch).await {
            ReadOutcome::Found(val) => Some(val),
            ReadOutcome::Missing => None,
            ReadOutcome::Corrupt(e) => {
                // A concurrent put landing between read and delete is lost; accepted
                warn!(
                    "Entry {} in cache {} can't be deserialized, invalidating: {}",
                    key,
                    self.dir.display(),
                    e
                );
                self.delete_file(&path).await;
                None
            }
            ReadOutcome::Unreadable(e) => {
                warn!("Cannot read cache {}: {}", path.display(), e);
                None
            }
        }
    }

    async fn put(&self, key: &str, val: &SessionVal) {
        let Some(target) = self.entry_path(key) else {
            return;
        };

        let content = match serde_json::to_vec(val) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot serialize session {}: {}", key, e);
                return;
            }
        };

        let temp = self.dir.join(key::temp_name());
        if let Err(e) = Self::write_then_rename(&temp, &target, &content).await {
            warn!("Cannot put {} into cache {}: {}", key, self.dir.display(), e);
            if let Err(e) = fs::remove_file(&temp).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Cannot remove temp file {}: {}", temp.display(), e);
                }
            }
        }
    }

    async fn invalidate(&self, key: &str) {
        if let Some(path) = self.entry_path(key) {
            self.delete_file(&path).await;
        }
    }

    /// Also drops temp files, so a write racing with this call is discarded
    async fn invalidate_all(&self) {
        let (keys, temps) = self.list_files().await;
        let mut removed = 0;
        for key in keys {
            if self.delete_file(&self.dir.join(&key)).await {
                removed += 1;
            }
        }
        for name in temps {
            self.delete_file(&self.dir.join(&name)).await;
        }
        info!("Invalidated all sessions ({} removed)", removed);
    }

    async fn snapshot(&self) -> HashMap<String, SessionVal> {
        let mut found = HashMap::new();
        for key in self.list_keys().await {
            if let ReadOutcome::Found(val) = self.read_entry(&self.dir.join(&key), Access::Peek).await {
                found.insert(key, val);
            }
        }
        found
    }

    async fn size(&self) -> usize {
        self.list_keys().await.len()
    }

    async fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let (keys, temps) = self.list_files().await;

        let mut report = match self.policy {
            ExpiryPolicy::Absolute => self.sweep_absolute(keys, now).await,
            ExpiryPolicy::LastAccess { max_age } => {
                self.sweep_last_access(keys, now, max_age).await
            }
        };
        report.abandoned_temp_files = self.sweep_temp_files(temps, now).await;

        debug!(
            scanned = report.scanned,
            removed = report.removed,
            skipped = report.skipped,
            abandoned_temp_files = report.abandoned_temp_files,
            "Sweep finished"
        );
        report
    }
}
