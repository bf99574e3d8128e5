//! Persistence adapters for the cache state
//!
//! Provides a `FileCacheStore` that keeps the whole cache state in a single
//! JSON file in an XDG-compliant cache directory, and a `NoopCacheStore`
//! for sessions that should not touch the disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::warn;

use super::CacheState;

/// File name used for the persisted cache state
pub const CACHE_FILE_NAME: &str = "estonian_registry_cache.json";

/// Errors that can occur while loading or saving the cache state
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("Cache storage I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Serializing the cache state failed
    #[error("Failed to serialize cache state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The persisted data could not be parsed and was discarded
    #[error("Discarded corrupt cache data: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// Durable key-value storage for the cache state
///
/// Both operations are best-effort: the cache logs failures and keeps
/// working in memory.
pub trait CacheStore: Send + Sync {
    /// Reads the persisted state, `Ok(None)` if nothing was stored yet
    fn load(&self) -> Result<Option<CacheState>, StoreError>;

    /// Replaces the persisted state with `state`
    fn save(&self, state: &CacheState) -> Result<(), StoreError>;
}

/// Stores the cache state as a JSON file on disk
///
/// Uses `~/.cache/regcache/` on Linux, or the equivalent XDG path on other
/// platforms.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    /// Directory where the cache file is stored
    cache_dir: PathBuf,
}

impl FileCacheStore {
    /// Creates a new store in the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "regcache")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new store with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Returns the directory the store writes to
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path of the cache file
    pub fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }
}

impl CacheStore for FileCacheStore {
    /// Corrupt files are deleted so the next session starts clean.
    fn load(&self) -> Result<Option<CacheState>, StoreError> {
        let path = self.cache_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<CacheState>(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path) {
                    warn!(
                        path = %path.display(),
                        error = %remove_err,
                        "failed to remove corrupt registry cache file"
                    );
                }
                Err(StoreError::Corrupt(e))
            }
        }
    }

    fn save(&self, state: &CacheState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir)?;
        let json = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;
        fs::write(self.cache_path(), json)?;
        Ok(())
    }
}

/// Store that keeps nothing; every session starts empty
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheStore;

impl CacheStore for NoopCacheStore {
    fn load(&self) -> Result<Option<CacheState>, StoreError> {
        Ok(None)
    }

    fn save(&self, _state: &CacheState) -> Result<(), StoreError> {
        Ok(())
    }
}
