//! Expiry sweep for the registry backend.
//!
//! The resolve path never deletes anything; reclamation happens only when
//! the sweep is invoked explicitly (the `gc` subcommand). The sweep
//! removes entries past their expiry horizon and cleans up orphaned
//! halves: payloads without a sidecar, sidecars without a payload, and
//! sidecars that no longer parse.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use super::registry::{RegistryEntry, RegistryStore};
use super::StoreResult;

/// What one sweep did.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GcSummary {
    /// Sidecars examined.
    pub scanned: usize,
    /// Expired entries removed (payload + sidecar).
    pub evicted: usize,
    /// Orphaned or malformed files removed.
    pub orphans_removed: usize,
    /// Bytes reclaimed across all removals.
    pub reclaimed_bytes: u64,
}

/// Sweep the registry now.
pub fn sweep(store: &RegistryStore) -> StoreResult<GcSummary> {
    sweep_at(store, Utc::now())
}

/// Sweep the registry as of `now` (injected for tests).
pub fn sweep_at(store: &RegistryStore, now: DateTime<Utc>) -> StoreResult<GcSummary> {
    let mut summary = GcSummary::default();

    for entry in WalkDir::new(store.dir()).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("walk error"))
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(key_hex) = name.strip_suffix(".json") {
            summary.scanned += 1;
            let payload = store.payload_path(key_hex);
            match parse_sidecar(path) {
                Some(meta) if meta.is_expired_at(now) => {
                    summary.reclaimed_bytes += file_size(&payload) + file_size(path);
                    remove_quietly(&payload);
                    fs::remove_file(path)?;
                    summary.evicted += 1;
                }
                Some(_) if !payload.is_file() => {
                    // Sidecar pointing at nothing: half an entry.
                    summary.reclaimed_bytes += file_size(path);
                    fs::remove_file(path)?;
                    summary.orphans_removed += 1;
                }
                Some(_) => {}
                None => {
                    summary.reclaimed_bytes += file_size(&payload) + file_size(path);
                    remove_quietly(&payload);
                    fs::remove_file(path)?;
                    summary.orphans_removed += 1;
                }
            }
        } else if let Some(key_hex) = name.strip_suffix(".png") {
            // The payload may already be gone if its sidecar was swept
            // earlier in this same walk.
            if !store.metadata_path(key_hex).is_file() && path.is_file() {
                summary.reclaimed_bytes += file_size(path);
                remove_quietly(path);
                summary.orphans_removed += 1;
            }
        }
    }

    debug!(
        scanned = summary.scanned,
        evicted = summary.evicted,
        orphans = summary.orphans_removed,
        bytes = summary.reclaimed_bytes,
        "registry sweep complete"
    );
    Ok(summary)
}

fn parse_sidecar(path: &Path) -> Option<RegistryEntry> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn remove_quietly(path: &Path) {
    let _ = fs::remove_file(path);
}
