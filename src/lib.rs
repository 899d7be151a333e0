//! thumbcache - thumbnail caching and invalidation engine for inline
//! link previews.
//!
//! Given a path to a media file, [`Resolver::resolve`] returns the path
//! of a still-image preview, generating one through an external frame
//! extractor only when no cached preview exists for that exact
//! `(path, mtime)` snapshot. Link scanning, overlay placement and command
//! dispatch are the caller's business; this crate is only the engine that
//! keeps previews consistent with on-disk file state.

pub mod config;
pub mod error;
pub mod generator;
pub mod key;
pub mod probe;
pub mod resolver;
pub mod store;

pub use config::{Backend, Config, ConfigError};
pub use error::PreviewError;
pub use generator::{FrameExtractor, GeneratorError, TempThumbnail, ThumbnailGenerator};
pub use key::CacheKey;
pub use probe::{Capabilities, ExtractorKind};
pub use resolver::Resolver;
pub use store::{CacheStore, GcSummary, RegistryEntry, RegistryStore, SimpleStore, StoreError};
