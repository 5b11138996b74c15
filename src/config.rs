// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file that wardrobe uses to simplify
//! the process of serialization and deserialization. File I/O is left to the
//! [`store`](crate::store) module.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// Default extension of outfit files.
pub const DEFAULT_EXTENSION: &str = "avatar";

/// Picker configuration layout.
///
/// # General Layout
///
/// Everything lives under a single `[settings]` table. The root names the
/// directory whose immediate subdirectories are categories. The extension
/// decides which files inside a category count as outfits. Excluded
/// categories are still listed by scans, but never drawn from when picking
/// across categories.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PickerConfig {
    /// Settings for the picker.
    pub settings: PickerSettings,
}

impl PickerConfig {
    /// Construct new configuration rooted at target path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            settings: PickerSettings {
                root: WardrobeRoot::new(root),
                ..Default::default()
            },
        }
    }

    /// Exclude listing of categories from selection.
    pub fn with_excluded(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.settings
            .excluded
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Take category back into selection.
    pub fn without_excluded(mut self, name: &str) -> Self {
        self.settings.excluded.remove(name);
        self
    }

    /// Move configuration to a different wardrobe root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.settings.root = WardrobeRoot::new(root);
        self
    }

    pub fn root(&self) -> &Path {
        self.settings.root.as_path()
    }

    pub fn excluded(&self) -> &BTreeSet<String> {
        &self.settings.excluded
    }

    pub fn extension(&self) -> &str {
        &self.settings.extension
    }
}

impl FromStr for PickerConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: PickerConfig =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on wardrobe root field.
        config.settings.root = WardrobeRoot::new(
            shellexpand::full(config.settings.root.to_string().as_str())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        // INVARIANT: Extension is stored without its leading dot.
        config.settings.extension = config.settings.extension.trim_start_matches('.').to_owned();

        Ok(config)
    }
}

impl Display for PickerConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Picker configuration settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct PickerSettings {
    /// Directory whose subdirectories are outfit categories.
    pub root: WardrobeRoot,

    /// File extension that marks a file as an outfit.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Categories left out of random selection.
    #[serde(default)]
    pub excluded: BTreeSet<String>,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            root: WardrobeRoot::default(),
            extension: default_extension(),
            excluded: BTreeSet::new(),
        }
    }
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.into()
}

/// Path acting as the root of all outfit categories.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct WardrobeRoot(PathBuf);

impl WardrobeRoot {
    /// Construct new wardrobe root.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Treat wardrobe root as [`Path`] slice.
    pub fn as_path(&self) -> &Path {
        self.0.as_path()
    }
}

impl Display for WardrobeRoot {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_path().to_string_lossy().as_ref())
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;
