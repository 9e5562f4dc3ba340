use super::cache::CacheError;
use super::config::ConfigError;
use crate::core::io::header::HeaderError;
use crate::core::io::xyz::XyzError;
use crate::core::matching::MatchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Malformed geometry in '{path}': {source}", path = path.display())]
    MalformedGeometry {
        path: PathBuf,
        #[source]
        source: XyzError,
    },

    #[error("No geometry file found for candidate '{dir}'", dir = dir.display())]
    MissingGeometry { dir: PathBuf },

    #[error("Header file not found: '{path}'", path = path.display())]
    MissingHeader { path: PathBuf },

    #[error("Malformed fragment declaration in '{path}': {source}", path = path.display())]
    MalformedFragmentation {
        path: PathBuf,
        #[source]
        source: HeaderError,
    },

    #[error("Invalid candidate directory '{path}': {reason}", path = path.display())]
    InvalidCandidate { path: PathBuf, reason: String },

    #[error(transparent)]
    Filesystem(#[from] CacheError),

    #[error("Failed to scan '{path}': {source}", path = path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Structure matching failed: {0}")]
    Matching(#[from] MatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
