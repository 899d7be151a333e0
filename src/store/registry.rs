//! Persistent, expiry-aware cache backend.
//!
//! Entries live under a platform data directory, namespaced by a purpose
//! tag. Each entry is a payload file named by its key plus a JSON metadata
//! sidecar recording when it was registered and when it expires. Writes
//! are write-through: payload and sidecar are synced to disk before
//! `store` returns, so the entry is durably present from the caller's
//! point of view.
//!
//! The store owns the physical lifetime of its entries: expired entries
//! read as misses immediately, and [`super::gc::sweep`] reclaims them.
//! Lookups never delete anything.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::generator::TempThumbnail;
use crate::key::CacheKey;

use super::{CacheStore, StoreError, StoreResult};

/// Default purpose tag for entries registered by this engine.
pub const DEFAULT_PURPOSE: &str = "link-previews";

/// Default expiry horizon for new entries.
pub const DEFAULT_EXPIRY_DAYS: u32 = 7;

/// Metadata sidecar for one registered entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Purpose tag of the registering subsystem.
    pub purpose: String,
    /// Hex cache key the payload is registered under.
    pub key: String,
    /// When this entry was registered (RFC 3339).
    pub created_at: String,
    /// When this entry becomes eligible for garbage collection (RFC 3339).
    pub expires_at: String,
}

impl RegistryEntry {
    /// Sidecar file extension alongside the `.png` payload.
    pub const METADATA_EXT: &'static str = "json";

    /// Create metadata for a new registration expiring `expiry_days` from now.
    pub fn new(purpose: &str, key: &CacheKey, expiry_days: u32) -> Self {
        let created = Utc::now();
        let expires = created + Duration::days(i64::from(expiry_days));
        Self {
            purpose: purpose.to_string(),
            key: key.to_hex(),
            created_at: created.to_rfc3339(),
            expires_at: expires.to_rfc3339(),
        }
    }

    /// Whether the entry is past its expiry horizon at `now`.
    ///
    /// An unparsable horizon counts as expired; the sweep will reclaim it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires) => now > expires,
            Err(_) => true,
        }
    }

    /// Whether the entry is past its expiry horizon right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Expiry-aware persistent backend.
pub struct RegistryStore {
    dir: PathBuf,
    purpose: String,
    expiry_days: u32,
}

impl RegistryStore {
    /// Open (creating if needed) the registry directory for `purpose`.
    ///
    /// `root` overrides the platform data directory, mainly for tests.
    pub fn open(
        root: Option<PathBuf>,
        purpose: impl Into<String>,
        expiry_days: u32,
    ) -> StoreResult<Self> {
        let purpose = purpose.into();
        let root = match root {
            Some(root) => root,
            None => ProjectDirs::from("dev", "thumbcache", "thumbcache")
                .ok_or(StoreError::NoDataDir)?
                .data_local_dir()
                .to_path_buf(),
        };
        let dir = root.join(&purpose);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            purpose,
            expiry_days,
        })
    }

    /// Directory holding payloads and sidecars for this purpose tag.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn payload_path(&self, key_hex: &str) -> PathBuf {
        self.dir.join(format!("{key_hex}.png"))
    }

    pub(crate) fn metadata_path(&self, key_hex: &str) -> PathBuf {
        self.dir
            .join(format!("{key_hex}.{}", RegistryEntry::METADATA_EXT))
    }

    /// Read the sidecar for a key. Missing or malformed sidecars read as
    /// no entry; the sweep cleans them up.
    pub(crate) fn read_entry(&self, key_hex: &str) -> StoreResult<Option<RegistryEntry>> {
        let path = self.metadata_path(key_hex);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                debug!(key = key_hex, error = %e, "malformed registry sidecar, treating as miss");
                Ok(None)
            }
        }
    }
}

impl CacheStore for RegistryStore {
    fn lookup(&self, key: &CacheKey) -> StoreResult<Option<PathBuf>> {
        let key_hex = key.to_hex();
        let Some(entry) = self.read_entry(&key_hex)? else {
            return Ok(None);
        };
        if entry.is_expired() {
            debug!(key = %key_hex, "registry entry expired, treating as miss");
            return Ok(None);
        }
        let payload = self.payload_path(&key_hex);
        if payload.is_file() {
            Ok(Some(payload))
        } else {
            Ok(None)
        }
    }

    fn store(&self, key: &CacheKey, thumb: TempThumbnail) -> StoreResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let key_hex = key.to_hex();
        let payload = self.payload_path(&key_hex);

        thumb.promote(&payload)?;
        // Immediate durable commit: the entry must be on disk before the
        // call returns, payload first so a crash between the two syncs
        // leaves an orphan payload (reclaimed by the sweep), never a
        // sidecar pointing at nothing usable.
        OpenOptions::new().read(true).open(&payload)?.sync_all()?;

        let entry = RegistryEntry::new(&self.purpose, key, self.expiry_days);
        let mut sidecar = File::create(self.metadata_path(&key_hex))?;
        sidecar.write_all(&serde_json::to_vec_pretty(&entry)?)?;
        sidecar.sync_all()?;

        debug!(key = %key_hex, expires_at = %entry.expires_at, "registered preview");
        Ok(payload)
    }
}
