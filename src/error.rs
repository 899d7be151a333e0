//! Crate-level error type.
//!
//! Each subsystem defines its own `thiserror` enum next to its code;
//! this umbrella exists for the coordinator and the binary, which cross
//! subsystem boundaries. Note that `Resolver::resolve` deliberately does
//! not return it: at that boundary every error becomes absence.

use thiserror::Error;

use crate::config::ConfigError;
use crate::generator::GeneratorError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
