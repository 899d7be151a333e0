//! Cache key derivation.
//!
//! A key identifies one `(path, mtime)` snapshot of a source file. A file
//! edited in place gets a new mtime and therefore a new key, so stale
//! previews are never served; they are simply never found again.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Deterministic digest identifying a `(path, modification-time)` snapshot.
///
/// Keys have no ownership relationship to the file; they are pure derived
/// values. Two snapshots with identical path and mtime always yield the
/// same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derive the key for a source file snapshot.
    ///
    /// Both inputs feed the digest; path alone is not enough, since an
    /// in-place edit must invalidate the previous preview.
    pub fn derive(path: &Path, mtime: SystemTime) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.as_os_str().as_encoded_bytes());
        // mtimes before the epoch are legal on some filesystems; keep the
        // sign out-of-band so pre- and post-epoch offsets cannot collide.
        match mtime.duration_since(UNIX_EPOCH) {
            Ok(offset) => {
                hasher.update([0u8]);
                hasher.update(offset.as_secs().to_le_bytes());
                hasher.update(offset.subsec_nanos().to_le_bytes());
            }
            Err(before) => {
                let offset = before.duration();
                hasher.update([1u8]);
                hasher.update(offset.as_secs().to_le_bytes());
                hasher.update(offset.subsec_nanos().to_le_bytes());
            }
        }
        Self(hasher.finalize().into())
    }

    /// Lowercase hex rendering, used in on-disk file names.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn mtime(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn same_inputs_same_key() {
        let path = Path::new("/media/clip.mp4");
        let a = CacheKey::derive(path, mtime(1_700_000_000));
        let b = CacheKey::derive(path, mtime(1_700_000_000));
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
    }

    #[test]
    fn mtime_change_changes_key() {
        let path = Path::new("/media/clip.mp4");
        let a = CacheKey::derive(path, mtime(1_700_000_000));
        let b = CacheKey::derive(path, mtime(1_700_000_001));
        assert_ne!(a, b);
    }

    #[test]
    fn subsecond_mtime_change_changes_key() {
        let path = Path::new("/media/clip.mp4");
        let t = mtime(1_700_000_000);
        let a = CacheKey::derive(path, t);
        let b = CacheKey::derive(path, t + Duration::from_nanos(1));
        assert_ne!(a, b);
    }

    #[test]
    fn path_change_changes_key() {
        let t = mtime(1_700_000_000);
        let a = CacheKey::derive(Path::new("/media/a.mp4"), t);
        let b = CacheKey::derive(Path::new("/media/b.mp4"), t);
        assert_ne!(a, b);
    }

    #[test]
    fn pre_epoch_mtime_does_not_collide_with_post_epoch() {
        let path = Path::new("/media/clip.mp4");
        let offset = Duration::from_secs(12345);
        let a = CacheKey::derive(path, UNIX_EPOCH + offset);
        let b = CacheKey::derive(path, UNIX_EPOCH - offset);
        assert_ne!(a, b);
    }

    #[test]
    fn hex_is_lowercase_and_fixed_length() {
        let key = CacheKey::derive(Path::new("/x"), mtime(0));
        let hex = key.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
