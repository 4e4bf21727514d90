//! Durable session cache
//!
//! Sessions live as one file per key in a single flat directory that may be
//! shared by several server processes. Consistency comes from the
//! filesystem, not from locks:
//!
//! - `put` writes a temp file and renames it over the target, so readers
//!   see either the old or the new content, never a partial file
//! - concurrent `put`s to one key race and the last rename wins; `put` is
//!   not a compare-and-swap or merge primitive
//! - deleting a missing file is a no-op, so `invalidate` may race freely
//!   with `get` and `sweep`
//! - enumerations (`snapshot`, `size`, `invalidate_all`) see whatever the
//!   directory listing returned at that instant
//! - `sweep` decides from one read and deletes later; it re-checks that the
//!   file is the one it read (mtime and inode) first, but a `put` landing in
//!   the gap between that re-check and the unlink is still removed
//! - `snapshot` and sweeps do not count as access under `LastAccess`; only
//!   `get` refreshes the access time
//! - temp files left by a writer that died mid-`put` are removed by `sweep`
//!   once older than an hour, and by `invalidate_all` unconditionally
//!
//! The directory must not be modified by anything other than a cache
//! instance while one is live.
//!
//! # Expiry policies
//!
//! | Policy | Staleness signal | Sweep cost |
//! |--------|------------------|------------|
//! | `Absolute` | `expires_at` inside each value | full read per entry |
//! | `LastAccess` | filesystem atime older than max age | metadata only |

pub mod flatfile;
pub mod key;

pub use flatfile::FlatFileCache;

use crate::session::SessionVal;
use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// How `sweep` decides that an entry is stale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Remove entries whose `expires_at` has passed
    Absolute,
    /// Remove files not accessed within `max_age`
    LastAccess { max_age: Duration },
}

impl fmt::Display for ExpiryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::LastAccess { max_age } => {
                write!(f, "last-access (max age {}h)", max_age.num_hours())
            }
        }
    }
}

/// Outcome of one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Entries deleted as stale
    pub removed: usize,
    /// Entries left alone because they could not be evaluated
    pub skipped: usize,
    /// Temp files of interrupted writes that were deleted
    #[serde(default)]
    pub abandoned_temp_files: usize,
}

/// Cache statistics placeholder; no backend collects any
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Uniform key-value contract over a session backend
///
/// Reads never fail: a missing or unreadable entry is `None`. Writes and
/// deletes are best-effort and only log on failure.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Look up one session
    async fn get(&self, key: &str) -> Option<SessionVal>;

    /// Store `val` under `key`, replacing any existing entry
    async fn put(&self, key: &str, val: &SessionVal);

    /// Remove one entry; missing keys are ignored
    async fn invalidate(&self, key: &str);

    /// Remove every entry
    async fn invalidate_all(&self);

    /// Point-in-time view of every readable entry
    async fn snapshot(&self) -> HashMap<String, SessionVal>;

    /// Number of entries present, readable or not
    async fn size(&self) -> usize;

    /// Remove stale entries according to the backend's expiry policy
    async fn sweep(&self) -> SweepReport;

    /// Look up several sessions, omitting the ones that are absent
    async fn get_all(&self, keys: &[String]) -> HashMap<String, SessionVal> {
        let mut found = HashMap::new();
        for key in keys {
            if let Some(val) = self.get(key).await {
                found.insert(key.clone(), val);
            }
        }
        found
    }

    /// Store each entry in turn; earlier writes stay if a later one fails
    async fn put_all(&self, entries: &HashMap<String, SessionVal>) {
        for (key, val) in entries {
            self.put(key, val).await;
        }
    }

    /// Remove each listed key
    async fn invalidate_keys(&self, keys: &[String]) {
        for key in keys {
            self.invalidate(key).await;
        }
        debug!(count = keys.len(), "Invalidated listed sessions");
    }

    /// Not implemented by any backend; always `None`
    fn stats(&self) -> Option<CacheStats> {
        warn!("stats() unimplemented");
        None
    }
}
