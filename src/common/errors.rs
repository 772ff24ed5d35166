use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ReclaimError>;

/// Typed errors for the library.
///
/// Only catalog discovery and disk-tree scanning surface errors to callers;
/// everything else degrades to partial results. The remaining variants are
/// used internally (cache persistence, config) and logged rather than raised
/// past a component boundary.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// A scan root exists but cannot be enumerated
    #[error("Scan root inaccessible: '{}': {source}", path.display())]
    ScanRootInaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing a cache file failed
    #[error("Cache I/O error at '{}': {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A cache file could not be encoded or decoded
    #[error("Cache format error in '{}': {source}", path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file is invalid
    #[error("Config error in '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// Moving an item to the trash failed
    #[error("Failed to move '{}' to trash: {message}", path.display())]
    Trash { path: PathBuf, message: String },
}

impl ReclaimError {
    /// Whether the caller may simply retry the operation later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReclaimError::ScanRootInaccessible { .. } | ReclaimError::CacheIo { .. }
        )
    }
}
