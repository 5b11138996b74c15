// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wardrobe directory scanning.
//!
//! The wardrobe root holds one directory per category, and each category
//! directory holds outfit files. Only the top-level of the root is evaluated,
//! so categories cannot be nested. Hidden directories are never categories.
//!
//! # Concurrency
//!
//! Every category directory is inspected by its own spawned task. Tasks finish
//! in whatever order the runtime pleases, so the joined listing is sorted by
//! category name before it is handed back. Each task also records the outfit
//! listing it found in the shared [`ScanCache`], which saves a second walk
//! when a selection follows a scan.
//!
//! # Failure
//!
//! Scans are all or nothing. Failing to read the root, or any one category,
//! fails the entire scan.

pub mod cache;

pub use cache::ScanCache;

use crate::{
    model::{Category, CategoryInfo, CategoryState, Item},
    rules,
};

use futures::stream::{FuturesUnordered, StreamExt};
use std::{
    collections::BTreeSet,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs::{self, DirEntry};
use tracing::{debug, instrument};

/// Filesystem scanner with read-through caching.
#[derive(Debug, Clone)]
pub struct Scanner {
    extension: String,
    cache: Arc<ScanCache>,
}

impl Scanner {
    /// Construct new scanner matching outfit files by extension.
    pub fn new(extension: impl Into<String>) -> Self {
        Self::with_cache(extension, Arc::new(ScanCache::new()))
    }

    /// Construct new scanner sharing an existing scan cache.
    pub fn with_cache(extension: impl Into<String>, cache: Arc<ScanCache>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_owned(),
            cache,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn cache(&self) -> &ScanCache {
        &self.cache
    }

    /// Drop every memoized listing.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// List categories of wardrobe root.
    ///
    /// Produces one [`CategoryInfo`] per visible subdirectory of root, sorted
    /// by name. Excluded categories are listed as
    /// [`CategoryState::UserExcluded`] without inspecting their contents.
    ///
    /// Served from the scan cache when the same root was already scanned
    /// against the same excluded set. Changes on disk show up only after
    /// [`Scanner::invalidate`].
    ///
    /// # Errors
    ///
    /// - Return [`ScanError::MissingRoot`] if root does not exist.
    /// - Return [`ScanError::ReadDir`] or [`ScanError::Inspect`] if root or
    ///   any category cannot be listed.
    /// - Return [`ScanError::Task`] if a scan task dies.
    #[instrument(skip(self, excluded), level = "debug")]
    pub async fn scan_categories(
        &self,
        root: &Path,
        excluded: &BTreeSet<String>,
    ) -> Result<Vec<CategoryInfo>> {
        if let Some(infos) = self.cache.categories(root, excluded) {
            debug!("serve {} categories from scan cache", infos.len());
            return Ok(infos);
        }

        let infos = self.walk_categories(root, excluded).await?;
        self.cache.store_categories(root, excluded, infos.clone());

        Ok(infos)
    }

    /// List outfits of a category sorted by file name.
    ///
    /// # Errors
    ///
    /// - Return [`ScanError::ReadDir`] or [`ScanError::Inspect`] if the
    ///   category directory cannot be listed.
    #[instrument(skip(self, category), fields(category = category.name()), level = "debug")]
    pub async fn category_items(&self, category: &Category) -> Result<Vec<Item>> {
        if let Some(items) = self.cache.items(category.path()) {
            debug!("serve {} outfits from scan cache", items.len());
            return Ok(items);
        }

        let listing = read_category(category, &self.extension).await?;
        self.cache.store_items(category.path(), listing.items.clone());

        Ok(listing.items)
    }

    async fn walk_categories(
        &self,
        root: &Path,
        excluded: &BTreeSet<String>,
    ) -> Result<Vec<CategoryInfo>> {
        debug!("scan wardrobe root {:?}", root.display());
        let mut entries = fs::read_dir(root).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ScanError::MissingRoot {
                    path: root.to_path_buf(),
                }
            } else {
                ScanError::ReadDir {
                    source,
                    path: root.to_path_buf(),
                }
            }
        })?;

        let mut categories = Vec::new();
        while let Some(entry) = next_entry(&mut entries, root).await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || !is_directory(&entry).await? {
                continue;
            }

            categories.push(Category::new(name, entry.path()));
        }

        let mut tasks = categories
            .into_iter()
            .map(|category| {
                let is_excluded = excluded.contains(category.name());
                let extension = self.extension.clone();
                let cache = Arc::clone(&self.cache);
                tokio::spawn(scan_category(category, is_excluded, extension, cache))
            })
            .collect::<FuturesUnordered<_>>();

        let mut infos = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.next().await {
            let result = joined.map_err(ScanError::from).and_then(|info| info);
            match result {
                Ok(info) => infos.push(info),
                Err(error) => {
                    // INVARIANT: No scan task outlives a failed scan.
                    for task in tasks.iter() {
                        task.abort();
                    }
                    return Err(error);
                }
            }
        }

        // INVARIANT: Output order never depends on task completion order.
        infos.sort_by(|lhs, rhs| lhs.category.name().cmp(rhs.category.name()));
        debug!("scanned {} categories", infos.len());

        Ok(infos)
    }
}

async fn scan_category(
    category: Category,
    is_excluded: bool,
    extension: String,
    cache: Arc<ScanCache>,
) -> Result<CategoryInfo> {
    if is_excluded {
        return Ok(CategoryInfo::new(category, CategoryState::UserExcluded, 0));
    }

    let listing = read_category(&category, &extension).await?;
    let state = if !listing.items.is_empty() {
        CategoryState::HasOutfits
    } else if listing.has_files {
        CategoryState::NoAvatarFiles
    } else {
        CategoryState::Empty
    };
    let outfit_count = listing.items.len();
    cache.store_items(category.path(), listing.items);

    Ok(CategoryInfo::new(category, state, outfit_count))
}

/// Contents of one category directory.
#[derive(Debug, Default)]
struct Listing {
    items: Vec<Item>,
    has_files: bool,
}

async fn read_category(category: &Category, extension: &str) -> Result<Listing> {
    let path = category.path();
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|source| ScanError::ReadDir {
            source,
            path: path.to_path_buf(),
        })?;

    let mut listing = Listing::default();
    while let Some(entry) = next_entry(&mut entries, path).await? {
        if is_directory(&entry).await? {
            continue;
        }

        listing.has_files = true;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if rules::is_qualifying_file(&file_name, extension) {
            listing.items.push(Item::new(file_name, category.clone()));
        }
    }
    listing
        .items
        .sort_by(|lhs, rhs| lhs.file_name().cmp(rhs.file_name()));

    Ok(listing)
}

async fn next_entry(entries: &mut fs::ReadDir, dir: &Path) -> Result<Option<DirEntry>> {
    entries
        .next_entry()
        .await
        .map_err(|source| ScanError::ReadDir {
            source,
            path: dir.to_path_buf(),
        })
}

async fn is_directory(entry: &DirEntry) -> Result<bool> {
    let file_type = entry
        .file_type()
        .await
        .map_err(|source| ScanError::Inspect {
            source,
            path: entry.path(),
        })?;

    // INVARIANT: Symlinks count by their target, dangling ones as plain files.
    if file_type.is_symlink() {
        return match fs::metadata(entry.path()).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(ScanError::Inspect {
                source,
                path: entry.path(),
            }),
        };
    }

    Ok(file_type.is_dir())
}

/// Filesystem failures while scanning.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Wardrobe root does not exist.
    #[error("wardrobe root {:?} does not exist", path.display())]
    MissingRoot { path: PathBuf },

    /// Directory cannot be listed.
    #[error("failed to list directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Directory entry cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Inspect {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Scan task panicked or was cancelled.
    #[error(transparent)]
    Task(#[from] tokio::task::JoinError),
}

/// Friendly result alias :3
pub type Result<T, E = ScanError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, remove_file, write};
    use tempfile::TempDir;

    fn wardrobe(layout: &[(&str, &[&str])]) -> anyhow::Result<TempDir> {
        let root = tempfile::tempdir()?;
        for (category, files) in layout {
            let dir = root.path().join(category);
            create_dir_all(&dir)?;
            for file in *files {
                write(dir.join(file), "outfit")?;
            }
        }

        Ok(root)
    }

    fn states(infos: &[CategoryInfo]) -> Vec<(&str, CategoryState, usize)> {
        infos
            .iter()
            .map(|info| (info.category.name(), info.state, info.outfit_count))
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scan_classifies_and_sorts_categories() -> anyhow::Result<()> {
        let root = wardrobe(&[
            ("formal", &["c.avatar"]),
            ("casual", &["a.avatar", "B.AVATAR", "notes.txt"]),
            ("empty", &[]),
            ("misc", &["readme.md"]),
            ("archive", &["old.avatar"]),
            (".hidden", &["x.avatar"]),
        ])?;
        write(root.path().join("stray.avatar"), "not a category")?;

        let scanner = Scanner::new("avatar");
        let excluded = BTreeSet::from(["archive".to_string()]);
        let infos = scanner.scan_categories(root.path(), &excluded).await?;

        assert_eq!(
            states(&infos),
            vec![
                ("archive", CategoryState::UserExcluded, 0),
                ("casual", CategoryState::HasOutfits, 2),
                ("empty", CategoryState::Empty, 0),
                ("formal", CategoryState::HasOutfits, 1),
                ("misc", CategoryState::NoAvatarFiles, 0),
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn scan_fills_item_cache_except_for_excluded() -> anyhow::Result<()> {
        let root = wardrobe(&[("casual", &["b.avatar", "a.avatar"]), ("archive", &["x.avatar"])])?;
        let scanner = Scanner::new("avatar");
        let excluded = BTreeSet::from(["archive".to_string()]);
        scanner.scan_categories(root.path(), &excluded).await?;

        let cached = scanner
            .cache()
            .items(&root.path().join("casual"))
            .unwrap_or_default();
        let names: Vec<_> = cached.iter().map(Item::file_name).collect();
        assert_eq!(names, vec!["a.avatar", "b.avatar"]);
        assert!(scanner.cache().items(&root.path().join("archive")).is_none());

        Ok(())
    }

    #[tokio::test]
    async fn scan_is_read_through_until_invalidated() -> anyhow::Result<()> {
        let root = wardrobe(&[("casual", &["a.avatar", "b.avatar"])])?;
        let scanner = Scanner::new("avatar");
        let excluded = BTreeSet::new();
        let category = Category::new("casual", root.path().join("casual"));

        assert_eq!(scanner.category_items(&category).await?.len(), 2);
        remove_file(root.path().join("casual/b.avatar"))?;
        assert_eq!(scanner.category_items(&category).await?.len(), 2);
        let infos = scanner.scan_categories(root.path(), &excluded).await?;
        assert_eq!(infos[0].outfit_count, 1);

        create_dir_all(root.path().join("formal"))?;
        assert_eq!(scanner.scan_categories(root.path(), &excluded).await?.len(), 1);

        scanner.invalidate();
        assert_eq!(scanner.category_items(&category).await?.len(), 1);
        assert_eq!(scanner.scan_categories(root.path(), &excluded).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn scan_cache_tracks_excluded_set() -> anyhow::Result<()> {
        let root = wardrobe(&[("casual", &["a.avatar"]), ("formal", &["c.avatar"])])?;
        let scanner = Scanner::new("avatar");

        let all = scanner.scan_categories(root.path(), &BTreeSet::new()).await?;
        assert_eq!(all[0].state, CategoryState::HasOutfits);

        let excluded = BTreeSet::from(["casual".to_string()]);
        let some = scanner.scan_categories(root.path(), &excluded).await?;
        assert_eq!(
            states(&some),
            vec![
                ("casual", CategoryState::UserExcluded, 0),
                ("formal", CategoryState::HasOutfits, 1),
            ]
        );

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn scan_follows_symlinks() -> anyhow::Result<()> {
        use std::os::unix::fs::symlink;

        let root = wardrobe(&[("casual", &["a.avatar"]), ("links", &[])])?;
        symlink(root.path().join("casual"), root.path().join("alias"))?;
        symlink(root.path().join("missing"), root.path().join("links/stale.txt"))?;
        symlink(root.path().join("casual"), root.path().join("links/nested"))?;

        let scanner = Scanner::new("avatar");
        let infos = scanner.scan_categories(root.path(), &BTreeSet::new()).await?;

        assert_eq!(
            states(&infos),
            vec![
                ("alias", CategoryState::HasOutfits, 1),
                ("casual", CategoryState::HasOutfits, 1),
                ("links", CategoryState::NoAvatarFiles, 0),
            ]
        );

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn category_items_unresolvable_symlink_fails() -> anyhow::Result<()> {
        use std::os::unix::fs::symlink;

        let root = wardrobe(&[("casual", &["a.avatar"])])?;
        let looped = root.path().join("casual/loop.avatar");
        symlink(&looped, &looped)?;

        let scanner = Scanner::new("avatar");
        let category = Category::new("casual", root.path().join("casual"));
        let result = scanner.category_items(&category).await;

        assert!(matches!(result, Err(ScanError::Inspect { .. })));
        assert!(scanner.cache().items(category.path()).is_none());

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn scan_fails_whole_when_one_category_fails() -> anyhow::Result<()> {
        use std::os::unix::fs::symlink;

        let root = wardrobe(&[
            ("casual", &["a.avatar", "b.avatar"]),
            ("formal", &["c.avatar"]),
            ("broken", &["d.avatar"]),
            ("sporty", &["e.avatar"]),
        ])?;
        let looped = root.path().join("broken/loop.avatar");
        symlink(&looped, &looped)?;

        let scanner = Scanner::new("avatar");
        let excluded = BTreeSet::new();
        let result = scanner.scan_categories(root.path(), &excluded).await;

        assert!(matches!(result, Err(ScanError::Inspect { .. })));
        assert!(scanner.cache().categories(root.path(), &excluded).is_none());

        Ok(())
    }

    #[tokio::test]
    async fn scan_missing_root_fails() {
        let scanner = Scanner::new("avatar");
        let result = scanner
            .scan_categories(Path::new("/definitely/not/a/wardrobe"), &BTreeSet::new())
            .await;

        assert!(matches!(result, Err(ScanError::MissingRoot { .. })));
    }

    #[tokio::test]
    async fn category_items_missing_directory_fails() -> anyhow::Result<()> {
        let root = wardrobe(&[])?;
        let scanner = Scanner::new("avatar");
        let category = Category::new("gone", root.path().join("gone"));

        let result = scanner.category_items(&category).await;
        assert!(matches!(result, Err(ScanError::ReadDir { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn empty_root_has_no_categories() -> anyhow::Result<()> {
        let root = wardrobe(&[])?;
        let scanner = Scanner::new(".avatar");

        assert_eq!(scanner.extension(), "avatar");
        assert!(scanner
            .scan_categories(root.path(), &BTreeSet::new())
            .await?
            .is_empty());

        Ok(())
    }
}
