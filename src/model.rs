// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wardrobe entity model.
//!
//! A __category__ is an immediate subdirectory of the wardrobe root, and an
//! __item__ is one outfit file inside a category. Items are read from disk on
//! every scan, while the record of what has been worn lives in the
//! [`RotationCache`], the only piece of this model that is ever persisted.
//!
//! # Functional Updates
//!
//! The rotation cache is never mutated in place. Every update hands back a
//! new aggregate that the caller saves in full, so a loaded cache can be
//! shared freely while a replacement is being prepared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Current layout version of the persisted rotation cache.
pub const ROTATION_CACHE_VERSION: u32 = 1;

/// Outfit category.
///
/// Identity is the name, scoped to one configured wardrobe root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category {
    name: String,
    path: PathBuf,
}

impl Category {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable key of category inside the rotation cache.
    pub fn cache_key(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// Single outfit file in a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    file_name: String,
    category: Category,
}

impl Item {
    pub fn new(file_name: impl Into<String>, category: Category) -> Self {
        Self {
            file_name: file_name.into(),
            category,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Absolute location of outfit file on disk.
    pub fn path(&self) -> PathBuf {
        self.category.path.join(&self.file_name)
    }

    /// Session identity of item: `(category name, file name)`.
    pub fn key(&self) -> (String, String) {
        (self.category.name.clone(), self.file_name.clone())
    }
}

impl Display for Item {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "{}/{}", self.category.name, self.file_name)
    }
}

/// Worn outfits of one category.
///
/// # Invariant
///
/// - Worn names are unique, so re-adding a worn name is a no-op.
/// - Total count is the authority for completion, even when the worn set has
///   drifted past it because files vanished from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWornState {
    worn: BTreeSet<String>,
    total: usize,
    last_updated: DateTime<Utc>,
}

impl CategoryWornState {
    /// Construct new empty worn state from last known outfit count.
    pub fn new(total: usize) -> Self {
        Self {
            worn: BTreeSet::new(),
            total,
            last_updated: Utc::now(),
        }
    }

    pub fn worn(&self) -> &BTreeSet<String> {
        &self.worn
    }

    pub fn worn_count(&self) -> usize {
        self.worn.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_worn(&self, file_name: &str) -> bool {
        self.worn.contains(file_name)
    }

    /// Number of outfits left before the rotation completes.
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.worn.len())
    }

    /// Return copy with outfit marked as worn.
    #[must_use]
    pub fn adding(&self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        if self.worn.contains(&file_name) {
            return self.clone();
        }

        let mut worn = self.worn.clone();
        worn.insert(file_name);
        Self {
            worn,
            total: self.total,
            last_updated: Utc::now(),
        }
    }

    /// Return copy with no worn outfits, keeping the total count.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self::new(self.total)
    }
}

/// Worn state of every category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationCache {
    categories: BTreeMap<String, CategoryWornState>,
    version: u32,
    created_at: DateTime<Utc>,
}

impl Default for RotationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationCache {
    pub fn new() -> Self {
        Self {
            categories: BTreeMap::new(),
            version: ROTATION_CACHE_VERSION,
            created_at: Utc::now(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn get(&self, key: &str) -> Option<&CategoryWornState> {
        self.categories.get(key)
    }

    /// Iterate all category states ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryWornState)> {
        self.categories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Worn state of category, or a fresh one sized to given total.
    pub fn state_or_new(&self, key: &str, total: usize) -> CategoryWornState {
        self.categories
            .get(key)
            .cloned()
            .unwrap_or_else(|| CategoryWornState::new(total))
    }

    /// Return copy with category state replaced.
    #[must_use]
    pub fn updating(&self, key: impl Into<String>, state: CategoryWornState) -> Self {
        let mut categories = self.categories.clone();
        categories.insert(key.into(), state);
        Self {
            categories,
            version: self.version,
            created_at: self.created_at,
        }
    }

    /// Return copy with outfit marked as worn in category.
    ///
    /// Creates category state sized to given total if it does not exist yet.
    #[must_use]
    pub fn adding_worn(&self, key: &str, file_name: &str, total: usize) -> Self {
        let state = self.state_or_new(key, total).adding(file_name);
        self.updating(key, state)
    }

    /// Return copy with category worn set cleared.
    ///
    /// Unknown categories are left alone.
    #[must_use]
    pub fn resetting(&self, key: &str) -> Self {
        match self.categories.get(key) {
            Some(state) => self.updating(key, state.reset()),
            None => self.clone(),
        }
    }

    /// Return copy without category entry at all.
    #[must_use]
    pub fn removing(&self, key: &str) -> Self {
        let mut categories = self.categories.clone();
        categories.remove(key);
        Self {
            categories,
            version: self.version,
            created_at: self.created_at,
        }
    }
}

/// What a scan found inside a category directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryState {
    /// Contains at least one outfit file.
    HasOutfits,

    /// Contains no files at all.
    Empty,

    /// Contains files, but none with the outfit extension.
    NoAvatarFiles,

    /// Excluded by configuration, contents never inspected.
    UserExcluded,
}

impl Display for CategoryState {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::HasOutfits => "has outfits",
            Self::Empty => "empty",
            Self::NoAvatarFiles => "no outfit files",
            Self::UserExcluded => "excluded",
        };
        fmt.write_str(label)
    }
}

/// Category paired with scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub category: Category,
    pub state: CategoryState,
    pub outfit_count: usize,
}

impl CategoryInfo {
    pub fn new(category: Category, state: CategoryState, outfit_count: usize) -> Self {
        Self {
            category,
            state,
            outfit_count,
        }
    }

    /// Category can be drawn from when picking across categories.
    pub fn is_selectable(&self) -> bool {
        self.state == CategoryState::HasOutfits
    }
}

/// Rotation progress of a category against its live outfits.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProgress {
    pub category: Category,
    pub worn: usize,
    pub total: usize,
}

impl CategoryProgress {
    pub fn progress(&self) -> f64 {
        crate::rules::progress(self.worn, self.total)
    }

    pub fn is_complete(&self) -> bool {
        crate::rules::is_complete(self.worn, self.total)
    }
}
