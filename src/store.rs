// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Persistent state storage.
//!
//! Wardrobe keeps two files of its own: the TOML configuration, and the JSON
//! rotation cache that records worn outfits. Both are read and written whole.
//!
//! # Whole-File Writes
//!
//! Saving writes the new contents to a temporary sibling file first, then
//! renames it over the target. A crash mid-save leaves either the old file or
//! the new one on disk, never a torn mix of both.
//!
//! # Single Writer
//!
//! Nothing here locks across a load and the save that follows it. Callers
//! keep at most one read-modify-write in flight per rotation cache.

use crate::{config::PickerConfig, model::RotationCache};

use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::{debug, instrument};

/// Layer of indirection for rotation cache persistence.
pub trait RotationStore: Send + Sync {
    /// Load rotation cache, or `None` if nothing was saved yet.
    fn load(&self) -> impl Future<Output = Result<Option<RotationCache>>> + Send;

    /// Replace stored rotation cache in full.
    fn save(&self, cache: &RotationCache) -> impl Future<Output = Result<()>> + Send;

    /// Remove stored rotation cache. Removing nothing is not an error.
    fn delete(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Rotation cache stored as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct JsonRotationStore {
    path: PathBuf,
}

impl JsonRotationStore {
    /// Construct new JSON store at target file path.
    ///
    /// Does not touch the filesystem until first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RotationStore for JsonRotationStore {
    #[instrument(skip(self), level = "debug")]
    async fn load(&self) -> Result<Option<RotationCache>> {
        let Some(data) = read_optional(&self.path).await? else {
            debug!("no rotation cache at {:?}", self.path.display());
            return Ok(None);
        };

        let cache = serde_json::from_str(&data).map_err(|source| StoreError::Decode {
            source,
            path: self.path.clone(),
        })?;

        Ok(Some(cache))
    }

    #[instrument(skip(self, cache), level = "debug")]
    async fn save(&self, cache: &RotationCache) -> Result<()> {
        let data = serde_json::to_string_pretty(cache).map_err(|source| StoreError::Encode {
            source,
            path: self.path.clone(),
        })?;

        write_whole(&self.path, data).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self) -> Result<()> {
        remove_optional(&self.path).await
    }
}

/// Configuration file on disk.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Construct new handle to configuration file at target path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load and parse configuration file.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Missing`] if configuration file does not exist.
    /// - Return [`StoreError::Io`] if configuration file cannot be read.
    /// - Return [`StoreError::Config`] if configuration file cannot be parsed.
    #[instrument(skip(self), level = "debug")]
    pub async fn load(&self) -> Result<PickerConfig> {
        let data = read_optional(&self.path)
            .await?
            .ok_or_else(|| StoreError::Missing {
                path: self.path.clone(),
            })?;

        data.parse().map_err(|source| StoreError::Config {
            source,
            path: self.path.clone(),
        })
    }

    /// Write configuration file, creating parent directories as needed.
    #[instrument(skip(self, config), level = "debug")]
    pub async fn save(&self, config: &PickerConfig) -> Result<()> {
        let data = toml::ser::to_string_pretty(config).map_err(|source| StoreError::Config {
            source: source.into(),
            path: self.path.clone(),
        })?;

        write_whole(&self.path, data).await
    }

    /// Remove configuration file if present.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self) -> Result<()> {
        remove_optional(&self.path).await
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(data) => Ok(Some(data)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            source,
            path: path.to_path_buf(),
        }),
    }
}

async fn write_whole(path: &Path, data: String) -> Result<()> {
    let io_error = |source| StoreError::Io {
        source,
        path: path.to_path_buf(),
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_error)?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    fs::write(&staging, data).await.map_err(io_error)?;
    fs::rename(&staging, path).await.map_err(io_error)?;
    debug!("wrote {:?}", path.display());

    Ok(())
}

async fn remove_optional(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            source,
            path: path.to_path_buf(),
        }),
    }
}

/// Persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Required file does not exist.
    #[error("{:?} does not exist", path.display())]
    Missing { path: PathBuf },

    /// File cannot be read, written, or removed.
    #[error("failed to access {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Rotation cache contents are not valid.
    #[error("failed to decode rotation cache at {:?}", path.display())]
    Decode {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Rotation cache cannot be encoded.
    #[error("failed to encode rotation cache for {:?}", path.display())]
    Encode {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },

    /// Configuration cannot be parsed or rendered.
    #[error("invalid configuration at {:?}", path.display())]
    Config {
        #[source]
        source: crate::config::ConfigError,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
