//! Cache store backends.
//!
//! A store is a durable key→file mapping. Two interchangeable backends
//! implement it:
//!
//! * [`simple::SimpleStore`]: a flat directory of key-named files with no
//!   expiry, suited to the platform temp directory.
//! * [`registry::RegistryStore`]: a persistent, expiry-aware store under a
//!   platform data directory, swept by [`gc`].
//!
//! The backend is chosen once, at construction time; call sites only ever
//! see the [`CacheStore`] trait.

pub mod gc;
pub mod registry;
pub mod simple;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::generator::TempThumbnail;
use crate::key::CacheKey;

pub use gc::{sweep, GcSummary};
pub use registry::{RegistryEntry, RegistryStore};
pub use simple::SimpleStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("entry metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("no usable data directory on this platform")]
    NoDataDir,
}

/// Durable key→preview-file mapping.
///
/// `store` must be overwrite-safe: two callers racing on the same miss may
/// both generate and both store, and the last writer wins with no
/// corruption. `lookup` is strictly read-only.
pub trait CacheStore {
    /// Resident path for `key`, if a live entry exists.
    fn lookup(&self, key: &CacheKey) -> StoreResult<Option<PathBuf>>;

    /// Promote a generated thumbnail to the resident entry for `key`,
    /// replacing any previous entry under the same key.
    fn store(&self, key: &CacheKey, thumb: TempThumbnail) -> StoreResult<PathBuf>;
}
