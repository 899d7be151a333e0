//! Flat-directory cache backend.
//!
//! Entries are files named `<prefix><hex-key>.png` in one directory,
//! the platform temp dir by default. Freshness is entirely encoded in the
//! key, so lookup is a bare existence check; there is no expiry and no
//! metadata. Entries persist until something external (an OS temp cleaner,
//! or [`purge`](SimpleStore::purge)) removes them.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::generator::TempThumbnail;
use crate::key::CacheKey;

use super::{CacheStore, StoreResult};

/// Default file-name prefix for cache entries.
pub const DEFAULT_PREFIX: &str = "thumbcache-";

/// Non-expiring flat-file backend.
pub struct SimpleStore {
    dir: PathBuf,
    prefix: String,
}

impl SimpleStore {
    /// Create a backend over `dir` (platform temp dir when `None`).
    pub fn new(dir: Option<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.unwrap_or_else(env::temp_dir),
            prefix: prefix.into(),
        }
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic resident path for a key.
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}{}.png", self.prefix, key))
    }

    /// Remove every entry carrying this store's prefix.
    ///
    /// Returns the number of files removed. Unrelated files in the
    /// directory are untouched.
    pub fn purge(&self) -> StoreResult<usize> {
        let mut removed = 0;
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&self.prefix) && name.ends_with(".png") {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        debug!(removed, dir = %self.dir.display(), "purged simple cache");
        Ok(removed)
    }
}

impl CacheStore for SimpleStore {
    fn lookup(&self, key: &CacheKey) -> StoreResult<Option<PathBuf>> {
        let path = self.entry_path(key);
        if path.is_file() {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    fn store(&self, key: &CacheKey, thumb: TempThumbnail) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        thumb.promote(&path)?;
        Ok(path)
    }
}
