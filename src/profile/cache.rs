use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file {} could not be written: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cache entry could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk layout: `{"data": ..., "timestamp": <epoch-ms>}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
}

/// A single JSON result cached on disk with a freshness window.
#[derive(Debug, Clone)]
pub struct ResultCache {
    path: PathBuf,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached data if it is younger than the freshness window at
    /// `now_ms`. Missing, stale and malformed entries all read as `None`;
    /// malformed ones are removed.
    pub fn read<T: DeserializeOwned>(&self, now_ms: i64) -> Option<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::debug!("cache {} unreadable: {e}", self.path.display());
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("discarding malformed cache {}: {e}", self.path.display());
                let _ = fs::remove_file(&self.path);
                return None;
            }
        };

        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if now_ms.saturating_sub(entry.timestamp) < ttl_ms {
            Some(entry.data)
        } else {
            log::debug!("cache {} expired", self.path.display());
            None
        }
    }

    pub fn write<T: Serialize>(&self, data: &T, now_ms: i64) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let encoded = serde_json::to_vec(&CacheEntry {
            data,
            timestamp: now_ms,
        })?;
        fs::write(&self.path, encoded).map_err(io_err)
    }
}
