// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Rotation rules.
//!
//! Pure functions that decide how far a category has rotated, when a rotation
//! is complete, and which outfits are still up for grabs.
//!
//! # Empty Categories
//!
//! A category with no outfits counts as fully rotated. Its progress is `1.0`
//! rather than `0.0`, so an empty category never keeps a global "anything
//! left?" check waiting on it.

use crate::model::Item;

use std::{
    collections::BTreeSet,
    path::{Component, Path},
};

/// Longest wardrobe root path accepted, in bytes.
pub const MAX_ROOT_LENGTH: usize = 4096;

/// Fraction of a category that has been worn.
pub fn progress(worn: usize, total: usize) -> f64 {
    if total == 0 {
        return 1.0;
    }

    worn as f64 / total as f64
}

/// Rotation is complete once every outfit has been worn.
///
/// Worn counts past the total are tolerated, since outfits may be deleted
/// from disk after being worn.
pub fn is_complete(worn: usize, total: usize) -> bool {
    worn >= total
}

/// Rotation must start over.
///
/// Checked after recording a worn outfit, never before, so the outfit that
/// completes a rotation still belongs to it.
pub fn should_reset(worn: usize, total: usize) -> bool {
    is_complete(worn, total)
}

/// Outfits not yet worn.
///
/// Keeps input order, which carries no meaning. Sort before showing it.
pub fn available_pool(items: &[Item], worn: &BTreeSet<String>) -> Vec<Item> {
    items
        .iter()
        .filter(|item| !worn.contains(item.file_name()))
        .cloned()
        .collect()
}

/// Outfits already worn.
pub fn worn_pool(items: &[Item], worn: &BTreeSet<String>) -> Vec<Item> {
    items
        .iter()
        .filter(|item| worn.contains(item.file_name()))
        .cloned()
        .collect()
}

/// File name carries the outfit extension, ignoring case.
pub fn is_qualifying_file(file_name: &str, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    file_name
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(extension))
}

/// Name is usable as a category or outfit name.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Reason a path cannot serve as wardrobe root, if any.
pub fn root_problem(path: &Path) -> Option<&'static str> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Some("path is empty");
    }

    if raw.len() > MAX_ROOT_LENGTH {
        return Some("path is too long");
    }

    if path
        .components()
        .any(|component| component == Component::ParentDir)
    {
        return Some("path traverses parent directories");
    }

    if raw.chars().any(char::is_control) {
        return Some("path contains control characters");
    }

    None
}
