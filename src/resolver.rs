//! Cache coordinator: the public entry point of the engine.
//!
//! `resolve` turns a source media path into a ready-to-display preview
//! path, generating and storing one only on a cache miss. Every failure
//! mode degrades to "no preview available"; nothing on this path may
//! panic or propagate an error into the caller's rendering loop.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Backend, Config};
use crate::error::PreviewError;
use crate::generator::{FrameExtractor, ThumbnailGenerator};
use crate::key::CacheKey;
use crate::probe::Capabilities;
use crate::store::{CacheStore, RegistryStore, SimpleStore};

/// Coordinates key derivation, lookup, generation and storage.
///
/// The backend and the generator are fixed at construction; `resolve`
/// itself never branches on configuration.
pub struct Resolver {
    generator: Option<Box<dyn ThumbnailGenerator>>,
    store: Box<dyn CacheStore>,
}

impl Resolver {
    /// Build a resolver from explicit parts. `generator` is `None` when
    /// the capability probe found no extraction tool; such a resolver
    /// still serves cache hits but never attempts generation.
    pub fn new(generator: Option<Box<dyn ThumbnailGenerator>>, store: Box<dyn CacheStore>) -> Self {
        Self { generator, store }
    }

    /// Build from configuration plus the startup capability probe.
    pub fn from_config(config: &Config, caps: &Capabilities) -> Result<Self, PreviewError> {
        let generator: Option<Box<dyn ThumbnailGenerator>> = caps
            .extractor
            .map(|kind| {
                Box::new(FrameExtractor::new(kind, config.generator_timeout()))
                    as Box<dyn ThumbnailGenerator>
            });
        let store: Box<dyn CacheStore> = match config.backend {
            Backend::Simple => Box::new(SimpleStore::new(
                config.cache_dir.clone(),
                config.file_prefix.clone(),
            )),
            Backend::Registry => Box::new(RegistryStore::open(
                config.cache_dir.clone(),
                config.purpose.clone(),
                config.expiry_days,
            )?),
        };
        Ok(Self::new(generator, store))
    }

    /// Resolve a preview for `source`.
    ///
    /// Returns the resident path of a still image, or `None` when no
    /// preview is available for any reason: missing source, no extractor
    /// installed, generation failure, or a store refusing a read/write.
    /// The caller should render nothing and not retry immediately; the
    /// next call simply repeats the miss-and-generate sequence.
    pub fn resolve(&self, source: &Path) -> Option<PathBuf> {
        match self.try_resolve(source) {
            Ok(preview) => preview,
            Err(e) => {
                warn!(source = %source.display(), error = %e, "preview resolution failed");
                None
            }
        }
    }

    fn try_resolve(&self, source: &Path) -> Result<Option<PathBuf>, PreviewError> {
        // Missing source: absence, no key, no cache interaction.
        let Ok(meta) = fs::metadata(source) else {
            debug!(source = %source.display(), "source unavailable");
            return Ok(None);
        };

        // No mtime means no key; generate uncached rather than erroring.
        let Ok(mtime) = meta.modified() else {
            debug!(source = %source.display(), "no mtime available, skipping cache");
            return self.generate_uncached(source);
        };

        let key = CacheKey::derive(source, mtime);
        if let Some(hit) = self.store.lookup(&key)? {
            debug!(source = %source.display(), key = %key, "cache hit");
            return Ok(Some(hit));
        }

        let Some(generator) = &self.generator else {
            return Ok(None);
        };
        let thumb = match generator.generate(source) {
            Ok(thumb) => thumb,
            Err(e) => {
                // No entry is written; the next resolve retries from scratch.
                debug!(source = %source.display(), error = %e, "generation failed");
                return Ok(None);
            }
        };
        let resident = self.store.store(&key, thumb)?;
        debug!(source = %source.display(), key = %key, path = %resident.display(), "preview stored");
        Ok(Some(resident))
    }

    /// Fallback for sources that can be read but not keyed: the preview
    /// is produced fresh each time and left as an unmanaged temp file.
    fn generate_uncached(&self, source: &Path) -> Result<Option<PathBuf>, PreviewError> {
        let Some(generator) = &self.generator else {
            return Ok(None);
        };
        match generator.generate(source) {
            Ok(thumb) => {
                let path = thumb.keep().map_err(crate::store::StoreError::from)?;
                Ok(Some(path))
            }
            Err(e) => {
                debug!(source = %source.display(), error = %e, "uncached generation failed");
                Ok(None)
            }
        }
    }
}
