// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where wardrobe keeps its own files: the configuration file that
//! names the wardrobe root, and the rotation cache that remembers what has
//! been worn. Neither function checks that the returned path exists.

use std::path::PathBuf;

/// Name of the directory wardrobe claims under XDG base directories.
const APP_DIR_NAME: &str = "wardrobe";

/// Determine default absolute path to the configuration file.
///
/// Uses `$XDG_CONFIG_HOME/wardrobe/config.toml`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if the configuration directory cannot be
///   determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join(APP_DIR_NAME).join("config.toml"))
        .ok_or(NoWayHome)
}

/// Determine default absolute path to the rotation cache.
///
/// Uses `$XDG_DATA_HOME/wardrobe/rotation.json`.
///
/// # Errors
///
/// - Return [`NoWayHome`] if the data directory cannot be determined.
pub fn default_rotation_cache_path() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join(APP_DIR_NAME).join("rotation.json"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
