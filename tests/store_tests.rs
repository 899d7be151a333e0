//! Backend-level behavior: deterministic naming, overwrite safety,
//! expiry-as-miss, the registry sweep, and purge.

use std::fs;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use thumbcache::store::gc::sweep_at;
use thumbcache::store::{CacheStore, RegistryEntry, RegistryStore, SimpleStore};
use thumbcache::{CacheKey, TempThumbnail};

fn key_for(name: &str) -> CacheKey {
    CacheKey::derive(
        Path::new(name),
        UNIX_EPOCH + Duration::from_secs(1_700_000_000),
    )
}

fn thumb_with(tmp: &TempDir, contents: &[u8]) -> TempThumbnail {
    let file = tempfile::NamedTempFile::new_in(tmp.path()).unwrap();
    fs::write(file.path(), contents).unwrap();
    TempThumbnail::new(file.into_temp_path())
}

// =========================================================================
// Simple backend
// =========================================================================

#[test]
fn simple_store_names_entries_by_prefix_and_key() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    let store = SimpleStore::new(Some(dir.clone()), "preview-");
    let key = key_for("/media/clip.mp4");

    let resident = store.store(&key, thumb_with(&tmp, b"png")).unwrap();
    assert_eq!(resident, dir.join(format!("preview-{}.png", key.to_hex())));
    assert_eq!(store.lookup(&key).unwrap(), Some(resident));
}

#[test]
fn simple_store_lookup_misses_unknown_keys() {
    let tmp = TempDir::new().unwrap();
    let store = SimpleStore::new(Some(tmp.path().to_path_buf()), "preview-");
    assert_eq!(store.lookup(&key_for("/never/stored.mp4")).unwrap(), None);
}

#[test]
fn simple_store_overwrites_on_same_key() {
    let tmp = TempDir::new().unwrap();
    let store = SimpleStore::new(Some(tmp.path().join("cache")), "preview-");
    let key = key_for("/media/clip.mp4");

    let first = store.store(&key, thumb_with(&tmp, b"first")).unwrap();
    let second = store.store(&key, thumb_with(&tmp, b"second")).unwrap();

    // Last writer wins; one resident file per key.
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"second");
}

#[test]
fn purge_removes_only_prefixed_entries() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("cache");
    let store = SimpleStore::new(Some(dir.clone()), "preview-");
    store
        .store(&key_for("/a.mp4"), thumb_with(&tmp, b"a"))
        .unwrap();
    store
        .store(&key_for("/b.mp4"), thumb_with(&tmp, b"b"))
        .unwrap();
    fs::write(dir.join("unrelated.png"), b"keep me").unwrap();

    assert_eq!(store.purge().unwrap(), 2);
    assert!(dir.join("unrelated.png").is_file());
}

#[test]
fn purge_on_a_missing_directory_removes_nothing() {
    let tmp = TempDir::new().unwrap();
    let store = SimpleStore::new(Some(tmp.path().join("never-created")), "preview-");
    assert_eq!(store.purge().unwrap(), 0);
}

// =========================================================================
// Registry backend
// =========================================================================

#[test]
fn registry_store_writes_payload_and_sidecar() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();
    let key = key_for("/media/clip.mp4");

    let resident = store.store(&key, thumb_with(&tmp, b"png")).unwrap();
    assert!(resident.is_file());

    let sidecar = resident.with_extension("json");
    let entry: RegistryEntry =
        serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(entry.purpose, "link-previews");
    assert_eq!(entry.key, key.to_hex());
    assert!(!entry.is_expired());

    assert_eq!(store.lookup(&key).unwrap(), Some(resident));
}

#[test]
fn expired_registry_entry_reads_as_miss() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();
    let key = key_for("/media/clip.mp4");
    let resident = store.store(&key, thumb_with(&tmp, b"png")).unwrap();

    // Backdate the horizon past expiry.
    let sidecar = resident.with_extension("json");
    let mut entry: RegistryEntry =
        serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    entry.expires_at = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap().to_rfc3339();
    fs::write(&sidecar, serde_json::to_vec_pretty(&entry).unwrap()).unwrap();

    assert_eq!(store.lookup(&key).unwrap(), None);
    // The payload is still on disk; only the sweep reclaims it.
    assert!(resident.is_file());
}

#[test]
fn sweep_evicts_expired_entries_and_keeps_live_ones() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();

    let live_key = key_for("/media/live.mp4");
    let dead_key = key_for("/media/dead.mp4");
    let live = store.store(&live_key, thumb_with(&tmp, b"live")).unwrap();
    let dead = store.store(&dead_key, thumb_with(&tmp, b"dead")).unwrap();

    // Sweep as of a moment safely past the 7-day horizon of `dead` only:
    // rewrite dead's horizon into the past instead of moving the clock.
    let sidecar = dead.with_extension("json");
    let mut entry: RegistryEntry =
        serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    entry.expires_at = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap().to_rfc3339();
    fs::write(&sidecar, serde_json::to_vec_pretty(&entry).unwrap()).unwrap();

    let summary = sweep_at(&store, Utc::now()).unwrap();
    assert_eq!(summary.scanned, 2);
    assert_eq!(summary.evicted, 1);
    assert!(summary.reclaimed_bytes > 0);

    assert!(!dead.is_file());
    assert!(!sidecar.is_file());
    assert!(live.is_file());
    assert_eq!(store.lookup(&live_key).unwrap(), Some(live));
}

#[test]
fn sweep_removes_orphaned_halves() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();

    // Payload without sidecar (crash between the two syncs).
    fs::write(store.dir().join("aaaa.png"), b"orphan payload").unwrap();
    // Sidecar without payload.
    let entry = RegistryEntry::new("link-previews", &key_for("/gone.mp4"), 7);
    fs::write(
        store.dir().join("bbbb.json"),
        serde_json::to_vec_pretty(&entry).unwrap(),
    )
    .unwrap();
    // Sidecar that no longer parses.
    fs::write(store.dir().join("cccc.json"), b"{ not json").unwrap();
    fs::write(store.dir().join("cccc.png"), b"payload of bad sidecar").unwrap();

    let summary = sweep_at(&store, Utc::now()).unwrap();
    assert_eq!(summary.orphans_removed, 3);
    assert!(!store.dir().join("aaaa.png").is_file());
    assert!(!store.dir().join("bbbb.json").is_file());
    assert!(!store.dir().join("cccc.json").is_file());
    assert!(!store.dir().join("cccc.png").is_file());
}

#[test]
fn sweep_of_an_empty_registry_is_a_no_op() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();
    let summary = sweep_at(&store, Utc::now()).unwrap();
    assert_eq!(summary.scanned, 0);
    assert_eq!(summary.evicted, 0);
    assert_eq!(summary.orphans_removed, 0);
}

#[test]
fn malformed_sidecar_is_a_miss_not_an_error() {
    let tmp = TempDir::new().unwrap();
    let store = RegistryStore::open(Some(tmp.path().to_path_buf()), "link-previews", 7).unwrap();
    let key = key_for("/media/clip.mp4");
    let resident = store.store(&key, thumb_with(&tmp, b"png")).unwrap();

    fs::write(resident.with_extension("json"), b"garbage").unwrap();
    assert_eq!(store.lookup(&key).unwrap(), None);
}
