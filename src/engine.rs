// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Outfit selection engine.
//!
//! The engine pairs a fresh scan of the wardrobe with the persisted
//! [`RotationCache`] to hand out outfits that have not been worn yet. Every
//! outfit in a category is worn once before any outfit repeats.
//!
//! # Rotation Lifecycle
//!
//! Marking an outfit as worn adds it to its category's worn set. The mark that
//! brings the worn count up to the category's total completes the rotation,
//! and the category starts over with an empty worn set right away. Callers
//! learn about it through [`WornOutcome::RotationCompleted`], which is a
//! success, not an error.
//!
//! # Drift
//!
//! Files can vanish from disk after being worn, leaving the worn set and the
//! live outfit listing out of sync. Completion is always judged against the
//! persisted total, so stale worn names never end a rotation early. When
//! picking from a single category, a rotation already complete by that total,
//! or a worn set that leaves no live outfit unworn, is reset, and the full
//! listing is drawn from.
//!
//! # Single Writer
//!
//! Every operation loads the rotation cache once and saves it whole. Nothing
//! locks across calls, so keep at most one mutating call in flight per
//! rotation cache.

use crate::{
    config::PickerConfig,
    model::{Category, CategoryInfo, CategoryProgress, Item, RotationCache},
    rules,
    scan::Scanner,
    store::{ConfigFile, JsonRotationStore, RotationStore},
};

use futures::future::try_join_all;
use rand::seq::SliceRandom;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Result of marking an outfit as worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WornOutcome {
    /// Outfit is now worn.
    Marked,

    /// Outfit was already worn, nothing changed.
    AlreadyWorn,

    /// Outfit completed its category's rotation, which now starts over.
    RotationCompleted,
}

/// Random outfit selection backed by persisted worn state.
#[derive(Debug)]
pub struct SelectionEngine<S = JsonRotationStore>
where
    S: RotationStore,
{
    config: PickerConfig,
    config_file: Option<ConfigFile>,
    scanner: Scanner,
    store: S,
}

impl<S> SelectionEngine<S>
where
    S: RotationStore,
{
    /// Construct new selection engine.
    ///
    /// Scanner uses the outfit extension of the configuration.
    pub fn new(config: PickerConfig, store: S) -> Self {
        let scanner = Scanner::new(config.extension());
        Self::with_scanner(config, scanner, store)
    }

    /// Construct new selection engine around an existing scanner.
    pub fn with_scanner(config: PickerConfig, scanner: Scanner, store: S) -> Self {
        Self {
            config,
            config_file: None,
            scanner,
            store,
        }
    }

    /// Persist configuration changes to target configuration file.
    ///
    /// Without one, configuration changes only last as long as the engine.
    pub fn with_config_file(mut self, config_file: ConfigFile) -> Self {
        self.config_file = Some(config_file);
        self
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace configuration.
    ///
    /// Drops every memoized scan, since root, exclusions, or extension may
    /// have changed.
    pub fn reconfigure(&mut self, config: PickerConfig) {
        info!("reconfigure wardrobe root {:?}", config.root().display());
        if config.extension() != self.scanner.extension() {
            self.scanner = Scanner::new(config.extension());
        } else {
            self.scanner.invalidate();
        }
        self.config = config;
    }

    /// Exclude category from picking across categories.
    ///
    /// The category does not need to exist yet. Excluding it twice changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if name is blank.
    /// - Return [`EngineError::Store`] if the configuration file cannot be
    ///   saved. The engine keeps its old configuration then.
    #[instrument(skip(self), level = "debug")]
    pub async fn exclude_category(&mut self, name: &str) -> Result<()> {
        validate_name(name, "category name")?;
        let config = self.config.clone().with_excluded([name]);
        self.commit_config(config).await?;
        info!("excluded category {name:?}");

        Ok(())
    }

    /// Take previously excluded category back into picking.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::exclude_category`].
    #[instrument(skip(self), level = "debug")]
    pub async fn include_category(&mut self, name: &str) -> Result<()> {
        validate_name(name, "category name")?;
        let config = self.config.clone().without_excluded(name);
        self.commit_config(config).await?;
        info!("included category {name:?}");

        Ok(())
    }

    /// Move wardrobe to a new root directory.
    ///
    /// Returns whether the root actually changed. On a change the rotation
    /// cache is deleted too if `clear_cache` is set, since worn state is keyed
    /// by category path.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidRoot`] if path is empty, too long,
    ///   traverses parent directories, or holds control characters.
    /// - Return [`EngineError::Store`] if the configuration file cannot be
    ///   saved or the rotation cache cannot be deleted.
    #[instrument(skip(self), level = "debug")]
    pub async fn change_root(&mut self, root: &Path, clear_cache: bool) -> Result<bool> {
        if let Some(reason) = rules::root_problem(root) {
            return Err(EngineError::InvalidRoot {
                path: root.to_path_buf(),
                reason,
            });
        }

        if root == self.config.root() {
            debug!("wardrobe root unchanged");
            return Ok(false);
        }

        let config = self.config.clone().with_root(root);
        self.commit_config(config).await?;
        if clear_cache {
            self.store.delete().await?;
            info!("cleared rotation cache of previous root");
        }

        Ok(true)
    }

    async fn commit_config(&mut self, config: PickerConfig) -> Result<()> {
        if let Some(file) = &self.config_file {
            file.save(&config).await?;
        }
        self.reconfigure(config);

        Ok(())
    }

    /// List every category of the wardrobe with its scan state.
    ///
    /// Excluded categories are listed too, tagged as excluded.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    pub async fn category_info(&self) -> Result<Vec<CategoryInfo>> {
        Ok(self
            .scanner
            .scan_categories(self.config.root(), self.config.excluded())
            .await?)
    }

    /// Pick random unworn outfit from named category.
    ///
    /// Does not mark the outfit as worn. Returns `None` if the category has
    /// no outfits at all.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if name is blank.
    /// - Return [`EngineError::CategoryNotFound`] if no such category exists.
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded
    ///   or saved.
    #[instrument(skip(self), level = "debug")]
    pub async fn pick_from_category(&self, name: &str) -> Result<Option<Item>> {
        let pool = self.category_pool(name).await?;
        Ok(pool.choose(&mut rand::thread_rng()).cloned())
    }

    /// Pick random unworn outfit from any selectable category.
    ///
    /// Each category with something left is equally likely, however many
    /// outfits it holds. Returns `None` once every category is fully worn.
    /// Never resets anything.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded.
    #[instrument(skip(self), level = "debug")]
    pub async fn pick_across_categories(&self) -> Result<Option<Item>> {
        let pools = self.available_pools().await?;
        let mut rng = rand::thread_rng();

        Ok(pools
            .choose(&mut rng)
            .and_then(|(_, pool)| pool.choose(&mut rng))
            .cloned())
    }

    /// Mark outfit as worn.
    ///
    /// Marking an outfit twice changes nothing the second time. Completing a
    /// rotation resets the category and reports
    /// [`WornOutcome::RotationCompleted`].
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if file or category name is
    ///   blank.
    /// - Return [`EngineError::CategoryNotFound`] if the category no longer
    ///   exists.
    /// - Return [`EngineError::NotAvailable`] if the outfit is not among the
    ///   category's current outfits.
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded
    ///   or saved.
    #[instrument(skip(self, item), fields(item = %item), level = "debug")]
    pub async fn mark_worn(&self, item: &Item) -> Result<WornOutcome> {
        validate_name(item.file_name(), "outfit file name")?;
        let category = self.find_category(item.category().name()).await?;
        let items = self.scanner.category_items(&category).await?;
        if !items.iter().any(|live| live.file_name() == item.file_name()) {
            return Err(EngineError::NotAvailable {
                category: category.name().to_owned(),
                file_name: item.file_name().to_owned(),
            });
        }

        let key = category.cache_key();
        let cache = self.load_cache().await?;
        let state = cache.state_or_new(&key, items.len());
        if state.is_worn(item.file_name()) {
            debug!("{item} already worn");
            return Ok(WornOutcome::AlreadyWorn);
        }

        let state = state.adding(item.file_name());
        let cache = cache.updating(&key, state.clone());
        self.store.save(&cache).await?;
        info!("marked {item} as worn");

        if rules::should_reset(state.worn_count(), state.total()) {
            self.store.save(&cache.resetting(&key)).await?;
            info!("rotation of {:?} complete, starting over", category.name());
            return Ok(WornOutcome::RotationCompleted);
        }

        Ok(WornOutcome::Marked)
    }

    /// Forget rotation of named category entirely.
    ///
    /// Drops the category's entry from the rotation cache, so its total is
    /// rebuilt from disk the next time it is touched.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if name is blank.
    /// - Return [`EngineError::CategoryNotFound`] if no such category exists.
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded
    ///   or saved.
    #[instrument(skip(self), level = "debug")]
    pub async fn reset_category(&self, name: &str) -> Result<()> {
        let category = self.find_category(name).await?;
        let key = category.cache_key();
        let cache = self.load_cache().await?;
        if cache.get(&key).is_none() {
            debug!("nothing to reset for {name:?}");
            return Ok(());
        }

        self.store.save(&cache.removing(&key)).await?;
        info!("reset rotation of {name:?}");

        Ok(())
    }

    /// Forget rotation of every category.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Store`] if the rotation cache cannot be saved.
    #[instrument(skip(self), level = "debug")]
    pub async fn reset_all(&self) -> Result<()> {
        self.store.save(&RotationCache::new()).await?;
        info!("reset rotation of every category");

        Ok(())
    }

    /// Delete persisted rotation cache altogether.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Store`] if the rotation cache cannot be deleted.
    #[instrument(skip(self), level = "debug")]
    pub async fn purge(&self) -> Result<()> {
        self.store.delete().await?;
        info!("purged rotation cache");

        Ok(())
    }

    /// Rotation progress of named category against its live outfits.
    ///
    /// Worn names whose files no longer exist are not counted.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if name is blank.
    /// - Return [`EngineError::CategoryNotFound`] if no such category exists.
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded.
    pub async fn progress(&self, name: &str) -> Result<CategoryProgress> {
        let (category, items, worn) = self.category_snapshot(name).await?;
        let worn = rules::worn_pool(&items, &worn).len();

        Ok(CategoryProgress {
            category,
            worn,
            total: items.len(),
        })
    }

    /// Outfits of named category not worn yet, sorted by file name.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::progress`].
    pub async fn unworn_items(&self, name: &str) -> Result<Vec<Item>> {
        let (_, items, worn) = self.category_snapshot(name).await?;
        Ok(rules::available_pool(&items, &worn))
    }

    /// Outfits of named category already worn, sorted by file name.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::progress`].
    pub async fn worn_items(&self, name: &str) -> Result<Vec<Item>> {
        let (_, items, worn) = self.category_snapshot(name).await?;
        Ok(rules::worn_pool(&items, &worn))
    }

    /// Check if outfit is worn in the current rotation.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded.
    pub async fn is_worn(&self, item: &Item) -> Result<bool> {
        let cache = self.load_cache().await?;
        Ok(cache
            .get(&item.category().cache_key())
            .is_some_and(|state| state.is_worn(item.file_name())))
    }

    /// Worn outfit names of every category that has any, keyed by category
    /// path and sorted.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::Store`] if the rotation cache cannot be loaded.
    pub async fn worn_summary(&self) -> Result<Vec<(String, Vec<String>)>> {
        let cache = self.load_cache().await?;

        Ok(cache
            .iter()
            .filter(|(_, state)| !state.worn().is_empty())
            .map(|(key, state)| (key.clone(), state.worn().iter().cloned().collect()))
            .collect())
    }

    /// Unworn outfits of named category, recovering from drift.
    ///
    /// A rotation that completed by its persisted total, or a worn set that
    /// leaves no live outfit unworn, is reset and saved, and the full listing
    /// is returned instead. Empty only if the category holds no outfits.
    pub(crate) async fn category_pool(&self, name: &str) -> Result<Vec<Item>> {
        let category = self.find_category(name).await?;
        let items = self.scanner.category_items(&category).await?;
        if items.is_empty() {
            debug!("category {name:?} has no outfits");
            return Ok(items);
        }

        let key = category.cache_key();
        let cache = self.load_cache().await?;
        let state = cache.state_or_new(&key, items.len());

        // INVARIANT: Completion is judged by the persisted total, never by
        //   comparing stale worn names against the live listing.
        let pool = rules::available_pool(&items, state.worn());
        if rules::should_reset(state.worn_count(), state.total()) || pool.is_empty() {
            warn!(
                "rotation of {name:?} already over ({} of {} worn, {} live), starting over",
                state.worn_count(),
                state.total(),
                items.len()
            );
            self.store.save(&cache.resetting(&key)).await?;
            return Ok(items);
        }

        debug!("{} of {} outfits available in {name:?}", pool.len(), items.len());
        Ok(pool)
    }

    /// Unworn outfits of every selectable category that has some left.
    ///
    /// Reads the rotation cache once for all categories.
    pub(crate) async fn available_pools(&self) -> Result<Vec<(Category, Vec<Item>)>> {
        let infos = self.category_info().await?;
        let cache = self.load_cache().await?;
        let selectable = infos
            .into_iter()
            .filter(CategoryInfo::is_selectable)
            .map(|info| info.category)
            .collect::<Vec<_>>();

        let listings = try_join_all(
            selectable
                .iter()
                .map(|category| self.scanner.category_items(category)),
        )
        .await?;

        let pools = selectable
            .into_iter()
            .zip(listings)
            .filter_map(|(category, items)| {
                let worn = cache
                    .get(&category.cache_key())
                    .map(|state| state.worn().clone())
                    .unwrap_or_default();
                let pool = rules::available_pool(&items, &worn);
                (!pool.is_empty()).then_some((category, pool))
            })
            .collect::<Vec<_>>();
        debug!("{} categories have outfits left", pools.len());

        Ok(pools)
    }

    /// Find category by name.
    ///
    /// # Errors
    ///
    /// - Return [`EngineError::InvalidInput`] if name is blank.
    /// - Return [`EngineError::CategoryNotFound`] if no such category exists.
    /// - Return [`EngineError::Scan`] if the wardrobe cannot be scanned.
    pub async fn find_category(&self, name: &str) -> Result<Category> {
        validate_name(name, "category name")?;
        self.category_info()
            .await?
            .into_iter()
            .find(|info| info.category.name() == name)
            .map(|info| info.category)
            .ok_or_else(|| EngineError::CategoryNotFound {
                name: name.to_owned(),
            })
    }

    async fn category_snapshot(
        &self,
        name: &str,
    ) -> Result<(Category, Vec<Item>, BTreeSet<String>)> {
        let category = self.find_category(name).await?;
        let items = self.scanner.category_items(&category).await?;
        let worn = self
            .load_cache()
            .await?
            .get(&category.cache_key())
            .map(|state| state.worn().clone())
            .unwrap_or_default();

        Ok((category, items, worn))
    }

    async fn load_cache(&self) -> Result<RotationCache> {
        Ok(self.store.load().await?.unwrap_or_default())
    }
}

fn validate_name(name: &str, what: &'static str) -> Result<()> {
    if !rules::is_valid_name(name) {
        return Err(EngineError::InvalidInput(format!("{what} cannot be empty")));
    }

    Ok(())
}

/// All possible error types for outfit selection.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Blank category or outfit name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Named category is not part of the wardrobe.
    #[error("category {name:?} not found")]
    CategoryNotFound { name: String },

    /// Path cannot serve as wardrobe root.
    #[error("invalid wardrobe root {:?}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: &'static str },

    /// Outfit is not among its category's current outfits.
    #[error("outfit {file_name:?} is not available in category {category:?}")]
    NotAvailable { category: String, file_name: String },

    /// Wardrobe cannot be scanned.
    #[error(transparent)]
    Scan(#[from] crate::scan::ScanError),

    /// Rotation cache or configuration cannot be loaded or saved.
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

impl EngineError {
    /// Process exit code for error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(..) | Self::InvalidRoot { .. } => 2,
            Self::CategoryNotFound { .. } | Self::NotAvailable { .. } => 3,
            Self::Scan(..) => 4,
            Self::Store(..) => 5,
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
