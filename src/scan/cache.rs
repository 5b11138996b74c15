// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Scan result memoization.
//!
//! Coarse read-through cache in front of the filesystem. Category listings
//! are keyed by wardrobe root together with the excluded category set, outfit
//! listings by category path. Nothing ever
//! expires on its own, the whole cache is dropped through
//! [`ScanCache::invalidate`] whenever the configuration changes.

use crate::model::{CategoryInfo, Item};

use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

/// Shared memo of scan results.
///
/// Every read or write takes the lock on its own. A read followed by a write
/// is not atomic across calls.
#[derive(Debug, Default)]
pub struct ScanCache {
    categories: Mutex<HashMap<CategoryKey, Vec<CategoryInfo>>>,
    items: Mutex<HashMap<PathBuf, Vec<Item>>>,
}

impl ScanCache {
    /// Construct new empty scan cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(
        &self,
        root: &Path,
        excluded: &BTreeSet<String>,
    ) -> Option<Vec<CategoryInfo>> {
        lock(&self.categories)
            .get(&(root.to_path_buf(), excluded.clone()))
            .cloned()
    }

    pub fn store_categories(
        &self,
        root: impl Into<PathBuf>,
        excluded: &BTreeSet<String>,
        infos: Vec<CategoryInfo>,
    ) {
        lock(&self.categories).insert((root.into(), excluded.clone()), infos);
    }

    pub fn items(&self, category_path: &Path) -> Option<Vec<Item>> {
        lock(&self.items).get(category_path).cloned()
    }

    pub fn store_items(&self, category_path: impl Into<PathBuf>, items: Vec<Item>) {
        lock(&self.items).insert(category_path.into(), items);
    }

    /// Forget every cached listing.
    pub fn invalidate(&self) {
        debug!("invalidate scan cache");
        lock(&self.categories).clear();
        lock(&self.items).clear();
    }
}

/// Wardrobe root with the excluded categories it was scanned against.
type CategoryKey = (PathBuf, BTreeSet<String>);

// INVARIANT: Listings are inserted whole, so a poisoned map stays consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
