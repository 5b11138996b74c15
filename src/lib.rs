// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Outfit rotation for a wardrobe of avatar files.
//!
//! A __wardrobe__ is a root directory whose subdirectories are __categories__,
//! each holding __outfits__: files carrying the configured extension. Wardrobe
//! picks outfits at random while making sure every outfit of a category gets
//! worn once before any of them comes around again.
//!
//! # Layers
//!
//! 1. [`scan`] lists categories and outfits, fanning out one task per
//!    category directory, with results memoized in a shared scan cache.
//! 2. [`engine`] combines scan results with the persisted rotation cache to
//!    pick unworn outfits and record worn ones.
//! 3. [`session`] remembers what was already shown during the current run,
//!    on top of the engine, without persisting anything.
//!
//! The rotation cache and configuration are stored through [`store`].

pub mod config;
pub mod engine;
pub mod model;
pub mod path;
pub mod rules;
pub mod scan;
pub mod session;
pub mod store;

pub use config::PickerConfig;
pub use engine::{EngineError, SelectionEngine, WornOutcome};
pub use model::{Category, CategoryInfo, CategoryProgress, CategoryState, Item, RotationCache};
pub use scan::Scanner;
pub use session::SessionTracker;
pub use store::{ConfigFile, JsonRotationStore, RotationStore};
