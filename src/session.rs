// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Per-run non-repeat tracking.
//!
//! A [`SessionTracker`] sits on top of a [`SelectionEngine`] and remembers
//! which outfits it already showed during the current run, so drawing again
//! offers something new. Nothing here is persisted. Shown sets live only as
//! long as the tracker.
//!
//! # Exhaustion
//!
//! Once every available outfit of a scope was shown, the scope's shown set is
//! cleared and the session starts over on its own. Persisted worn state is
//! never touched by that.

use crate::{
    engine::{Result, SelectionEngine, WornOutcome},
    model::Item,
    store::{JsonRotationStore, RotationStore},
};

use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// Selection engine with memory of what was shown this run.
///
/// All methods take `&mut self`, which serializes session mutations per
/// tracker.
#[derive(Debug)]
pub struct SessionTracker<S = JsonRotationStore>
where
    S: RotationStore,
{
    engine: SelectionEngine<S>,
    global: HashSet<(String, String)>,
    per_category: HashMap<String, HashSet<String>>,
}

impl<S> SessionTracker<S>
where
    S: RotationStore,
{
    /// Construct new session with nothing shown yet.
    pub fn new(engine: SelectionEngine<S>) -> Self {
        Self {
            engine,
            global: HashSet::new(),
            per_category: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &SelectionEngine<S> {
        &self.engine
    }

    /// Draw unworn outfit from any selectable category not shown yet this run.
    ///
    /// Returns `None` only if no category has unworn outfits left.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::pick_across_categories`].
    #[instrument(skip(self), level = "debug")]
    pub async fn next_unique(&mut self) -> Result<Option<Item>> {
        let pools = self.engine.available_pools().await?;
        let mut fresh = pools
            .iter()
            .map(|(_, pool)| {
                pool.iter()
                    .filter(|item| !self.global.contains(&item.key()))
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .filter(|pool| !pool.is_empty())
            .collect::<Vec<_>>();

        if fresh.is_empty() && !pools.is_empty() {
            debug!("every available outfit shown, restart global session");
            self.global.clear();
            fresh = pools.into_iter().map(|(_, pool)| pool).collect();
        }

        let mut rng = rand::thread_rng();
        let pick = fresh
            .choose(&mut rng)
            .and_then(|pool| pool.choose(&mut rng))
            .cloned();
        if let Some(item) = &pick {
            self.global.insert(item.key());
        }

        Ok(pick)
    }

    /// Draw unworn outfit from named category not shown yet this run.
    ///
    /// Returns `None` only if the category holds no outfits.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::pick_from_category`].
    #[instrument(skip(self), level = "debug")]
    pub async fn next_unique_in(&mut self, name: &str) -> Result<Option<Item>> {
        let pool = self.engine.category_pool(name).await?;
        let shown = self.per_category.entry(name.to_owned()).or_default();
        let mut fresh = pool
            .iter()
            .filter(|item| !shown.contains(item.file_name()))
            .cloned()
            .collect::<Vec<_>>();

        if fresh.is_empty() && !pool.is_empty() {
            debug!("every outfit of {name:?} shown, restart category session");
            shown.clear();
            fresh = pool;
        }

        let pick = fresh.choose(&mut rand::thread_rng()).cloned();
        if let Some(item) = &pick {
            shown.insert(item.file_name().to_owned());
        }

        Ok(pick)
    }

    /// Mark outfit as worn through the engine.
    ///
    /// On success the global shown set and the shown set of the outfit's
    /// category are cleared.
    ///
    /// # Errors
    ///
    /// Same as [`SelectionEngine::mark_worn`]. Shown sets stay as they were.
    pub async fn mark_worn(&mut self, item: &Item) -> Result<WornOutcome> {
        let outcome = self.engine.mark_worn(item).await?;
        self.global.clear();
        self.per_category.remove(item.category().name());

        Ok(outcome)
    }

    pub fn reset_global_session(&mut self) {
        self.global.clear();
    }

    pub fn reset_category_session(&mut self, name: &str) {
        self.per_category.remove(name);
    }

    /// Number of outfits shown this run by global draws.
    pub fn shown_global(&self) -> usize {
        self.global.len()
    }

    /// Number of outfits of named category shown this run.
    pub fn shown_in(&self, name: &str) -> usize {
        self.per_category.get(name).map_or(0, HashSet::len)
    }
}
