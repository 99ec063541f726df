use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ShiplogError};
use crate::model::CommitSet;

/// One cache entry as stored on disk, one JSON file per key.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
    ttl_secs: u64,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.timestamp);
        age.num_seconds() < 0 || age.num_seconds() as u64 > self.ttl_secs
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub total_files: usize,
    pub expired_files: usize,
    pub total_bytes: u64,
}

/// Generic TTL-keyed file cache with expiry-on-read.
///
/// Corrupt or expired entries are deleted and reported as misses; the read
/// path never surfaces them as errors.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir,
            None => crate::config::default_cache_dir()?,
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| ShiplogError::Cache(format!("failed to create cache directory: {e}")))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key);

        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ShiplogError::Cache(format!("failed to read cache file: {e}"))),
        };

        let entry: Entry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("removing corrupt cache entry {key}: {e}");
                let _ = std::fs::remove_file(&path);
                return Ok(None);
            }
        };

        if entry.is_expired(Utc::now()) {
            debug!("cache entry expired, removed: {key}");
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                debug!("cache hit: {key}");
                Ok(Some(value))
            }
            Err(e) => {
                warn!("removing undeserializable cache entry {key}: {e}");
                let _ = std::fs::remove_file(&path);
                Ok(None)
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> Result<()> {
        let entry = Entry {
            data: serde_json::to_value(data)?,
            timestamp: Utc::now(),
            ttl_secs: ttl.as_secs(),
        };
        let raw = serde_json::to_vec(&entry)?;
        std::fs::write(self.entry_path(key), raw)
            .map_err(|e| ShiplogError::Cache(format!("failed to write cache file: {e}")))?;
        debug!("cache entry saved: {key} (ttl {}s)", ttl.as_secs());
        Ok(())
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| ShiplogError::Cache(format!("failed to list cache directory: {e}")))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Remove every entry; returns how many files were deleted.
    pub fn clear(&self) -> Result<usize> {
        let files = self.entry_files()?;
        let mut removed = 0;
        for file in files {
            if std::fs::remove_file(&file).is_ok() {
                removed += 1;
            }
        }
        info!("cache cleared, {removed} files removed");
        Ok(removed)
    }

    /// Remove entries whose file name starts with `prefix`.
    pub fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for file in self.entry_files()? {
            let matches = file
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            if matches && std::fs::remove_file(&file).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        let now = Utc::now();

        for file in self.entry_files()? {
            stats.total_files += 1;
            if let Ok(meta) = std::fs::metadata(&file) {
                stats.total_bytes += meta.len();
            }
            let Ok(raw) = std::fs::read(&file) else {
                continue;
            };
            match serde_json::from_slice::<Entry>(&raw) {
                Ok(entry) if entry.is_expired(now) => stats.expired_files += 1,
                Ok(_) => {}
                Err(_) => stats.expired_files += 1,
            }
        }

        Ok(stats)
    }
}

/// Cache seam for commit lookups keyed by (user, date-range query).
pub trait CommitCache: Send + Sync {
    fn get(&self, user: &str, query: &str) -> Result<Option<CommitSet>>;
    fn set(&self, user: &str, query: &str, data: &CommitSet, ttl: Duration) -> Result<()>;
    /// Remove cached entries for one user, leaving other users' entries.
    fn invalidate(&self, user: &str) -> Result<usize>;
    fn clear(&self) -> Result<usize>;
}

/// Commit cache over [`FileCache`].
///
/// File names embed a short hash of the user so `invalidate` can stay
/// user-scoped without reading entries back.
pub struct CommitsCache {
    files: FileCache,
}

const PURPOSE: &str = "commits";

impl CommitsCache {
    pub fn open(dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            files: FileCache::open(dir)?,
        })
    }

    fn user_tag(user: &str) -> String {
        let digest = md5::compute(user.as_bytes());
        format!("{digest:x}")[..10].to_string()
    }

    fn key(user: &str, query: &str) -> String {
        let digest = md5::compute(format!("{PURPOSE}-{user}-{query}").as_bytes());
        format!("{PURPOSE}-{}-{digest:x}.json", Self::user_tag(user))
    }
}

impl CommitCache for CommitsCache {
    fn get(&self, user: &str, query: &str) -> Result<Option<CommitSet>> {
        self.files.get(&Self::key(user, query))
    }

    fn set(&self, user: &str, query: &str, data: &CommitSet, ttl: Duration) -> Result<()> {
        self.files.set(&Self::key(user, query), data, ttl)
    }

    fn invalidate(&self, user: &str) -> Result<usize> {
        let prefix = format!("{PURPOSE}-{}-", Self::user_tag(user));
        let removed = self.files.remove_prefix(&prefix)?;
        info!("cache invalidated for user, {removed} files removed");
        Ok(removed)
    }

    fn clear(&self) -> Result<usize> {
        self.files.clear()
    }
}
