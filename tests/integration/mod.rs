// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::WardrobeFixture;

use anyhow::Result;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use wardrobe::{
    CategoryState, EngineError, JsonRotationStore, RotationCache, RotationStore, SessionTracker,
    WornOutcome,
};

fn casual_and_formal() -> Result<WardrobeFixture> {
    WardrobeFixture::new()?
        .with_category("casual", &["a.avatar", "b.avatar"])?
        .with_category("formal", &["c.avatar"])
}

#[tokio::test]
async fn pick_across_categories_draws_any_unworn_outfit() -> Result<()> {
    let fixture = casual_and_formal()?;
    let engine = fixture.engine();
    let expect = ["a.avatar", "b.avatar", "c.avatar"];

    let pick = engine.pick_across_categories().await?.expect("outfit available");
    assert!(expect.contains(&pick.file_name()));

    Ok(())
}

#[tokio::test]
async fn pick_across_categories_at_capacity_finds_nothing() -> Result<()> {
    let fixture = casual_and_formal()?;
    let store = JsonRotationStore::new(fixture.cache_path());
    let cache = RotationCache::new()
        .adding_worn(&fixture.key("casual"), "a.avatar", 2)
        .adding_worn(&fixture.key("casual"), "b.avatar", 2)
        .adding_worn(&fixture.key("formal"), "c.avatar", 1);
    store.save(&cache).await?;

    let engine = fixture.engine();
    assert_eq!(engine.pick_across_categories().await?, None);
    assert_eq!(store.load().await?, Some(cache));

    Ok(())
}

#[tokio::test]
async fn wearing_everything_restarts_each_category() -> Result<()> {
    let fixture = casual_and_formal()?;
    let engine = fixture.engine();

    assert_eq!(
        engine.mark_worn(&fixture.item("casual", "a.avatar")).await?,
        WornOutcome::Marked
    );
    assert_eq!(
        engine.mark_worn(&fixture.item("casual", "b.avatar")).await?,
        WornOutcome::RotationCompleted
    );
    assert_eq!(
        engine.mark_worn(&fixture.item("formal", "c.avatar")).await?,
        WornOutcome::RotationCompleted
    );

    assert!(engine.worn_summary().await?.is_empty());
    assert!(engine.pick_across_categories().await?.is_some());

    Ok(())
}

#[tokio::test]
async fn excluded_category_is_listed_but_never_drawn() -> Result<()> {
    let fixture = casual_and_formal()?;
    let engine = fixture.engine_with(fixture.config().with_excluded(["casual"]));

    let infos = engine.category_info().await?;
    let states = infos
        .iter()
        .map(|info| (info.category.name().to_owned(), info.state, info.outfit_count))
        .collect::<Vec<_>>();
    assert_eq!(
        states,
        vec![
            ("casual".to_string(), CategoryState::UserExcluded, 0),
            ("formal".to_string(), CategoryState::HasOutfits, 1),
        ]
    );

    for _ in 0..16 {
        let pick = engine.pick_across_categories().await?.expect("outfit available");
        assert_eq!(pick.category().name(), "formal");
    }

    Ok(())
}

#[tokio::test]
async fn worn_state_survives_new_engine() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar", "c.avatar"])?;
    let outfit = fixture.item("casual", "b.avatar");

    fixture.engine().mark_worn(&outfit).await?;

    let engine = fixture.engine();
    assert!(engine.is_worn(&outfit).await?);
    let progress = engine.progress("casual").await?;
    assert_eq!((progress.worn, progress.total), (1, 3));

    Ok(())
}

#[tokio::test]
async fn mark_worn_twice_leaves_same_state() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar", "c.avatar"])?;
    let store = JsonRotationStore::new(fixture.cache_path());
    let engine = fixture.engine();
    let outfit = fixture.item("casual", "a.avatar");

    engine.mark_worn(&outfit).await?;
    let once = store.load().await?;
    assert_eq!(engine.mark_worn(&outfit).await?, WornOutcome::AlreadyWorn);
    assert_eq!(store.load().await?, once);

    Ok(())
}

#[tokio::test]
async fn deleted_outfit_cannot_be_worn() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar"])?;
    fixture.remove_outfit("casual", "b.avatar")?;
    let engine = fixture.engine();

    let result = engine.mark_worn(&fixture.item("casual", "b.avatar")).await;
    assert!(matches!(result, Err(EngineError::NotAvailable { .. })));

    Ok(())
}

#[tokio::test]
async fn drifted_category_starts_over_on_pick() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar", "c.avatar"])?;
    let engine = fixture.engine();
    engine.mark_worn(&fixture.item("casual", "a.avatar")).await?;
    engine.mark_worn(&fixture.item("casual", "b.avatar")).await?;
    fixture.remove_outfit("casual", "c.avatar")?;

    let engine = fixture.engine();
    let pick = engine.pick_from_category("casual").await?.expect("outfit available");
    assert!(["a.avatar", "b.avatar"].contains(&pick.file_name()));
    assert!(engine.worn_items("casual").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn stale_worn_name_does_not_end_rotation_early() -> Result<()> {
    let fixture = WardrobeFixture::new()?
        .with_category("casual", &["a.avatar", "b.avatar", "c.avatar", "d.avatar"])?;
    let engine = fixture.engine();
    for file in ["a.avatar", "b.avatar", "c.avatar"] {
        assert_eq!(
            engine.mark_worn(&fixture.item("casual", file)).await?,
            WornOutcome::Marked
        );
    }
    fixture.remove_outfit("casual", "c.avatar")?;

    let engine = fixture.engine();
    for _ in 0..32 {
        let pick = engine.pick_from_category("casual").await?.expect("outfit available");
        assert_eq!(pick.file_name(), "d.avatar");
    }

    let worn = engine
        .worn_items("casual")
        .await?
        .iter()
        .map(|item| item.file_name().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(worn, vec!["a.avatar", "b.avatar"]);

    Ok(())
}

#[tokio::test]
async fn config_changes_survive_new_engine() -> Result<()> {
    let fixture = casual_and_formal()?;
    let file = fixture.config_file();
    file.save(&fixture.config()).await?;

    let mut engine = fixture.engine().with_config_file(file.clone());
    engine.exclude_category("casual").await?;

    let engine = fixture.engine_with(file.load().await?);
    for _ in 0..16 {
        let pick = engine.pick_across_categories().await?.expect("outfit available");
        assert_eq!(pick.category().name(), "formal");
    }

    Ok(())
}

#[tokio::test]
async fn reset_and_purge() -> Result<()> {
    let fixture = casual_and_formal()?;
    let engine = fixture.engine();
    engine.mark_worn(&fixture.item("casual", "a.avatar")).await?;

    engine.reset_category("casual").await?;
    assert!(!engine.is_worn(&fixture.item("casual", "a.avatar")).await?);

    engine.mark_worn(&fixture.item("casual", "a.avatar")).await?;
    engine.reset_all().await?;
    assert!(engine.worn_summary().await?.is_empty());

    engine.purge().await?;
    assert!(!fixture.cache_path().exists());

    Ok(())
}

#[tokio::test]
async fn session_visits_every_outfit_before_repeating() -> Result<()> {
    let fixture = WardrobeFixture::new()?
        .with_category("casual", &["a.avatar", "b.avatar", "c.avatar"])?
        .with_category("formal", &["d.avatar", "e.avatar"])?;
    let mut session = SessionTracker::new(fixture.engine());

    let mut seen = HashSet::new();
    for _ in 0..5 {
        let pick = session.next_unique().await?.expect("outfit available");
        assert!(seen.insert(pick.key()));
    }
    assert_eq!(seen.len(), 5);

    Ok(())
}

#[tokio::test]
async fn session_restarts_after_two_outfits() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar"])?;
    let mut session = SessionTracker::new(fixture.engine());

    let first = session.next_unique().await?.expect("outfit available");
    let second = session.next_unique().await?.expect("outfit available");
    let third = session.next_unique().await?.expect("outfit available");

    assert_ne!(first, second);
    assert!(third == first || third == second);

    Ok(())
}

#[tokio::test]
async fn session_wear_resets_shown_outfits() -> Result<()> {
    let fixture = WardrobeFixture::new()?.with_category("casual", &["a.avatar", "b.avatar", "c.avatar"])?;
    let mut session = SessionTracker::new(fixture.engine());

    let pick = session.next_unique_in("casual").await?.expect("outfit available");
    assert_eq!(session.mark_worn(&pick).await?, WornOutcome::Marked);
    assert_eq!(session.shown_in("casual"), 0);

    for _ in 0..8 {
        let next = session.next_unique_in("casual").await?.expect("outfit available");
        assert_ne!(next, pick);
    }

    Ok(())
}
