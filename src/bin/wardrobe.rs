// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use wardrobe::{
    path::{default_config_path, default_rotation_cache_path},
    store::ConfigFile,
    EngineError, Item, JsonRotationStore, SelectionEngine, SessionTracker, WornOutcome,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::exit};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "wardrobe [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to configuration file.
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to rotation cache.
    #[arg(long, global = true, value_name = "path")]
    pub cache: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let mut engine = self.engine().await?;
        match self.command {
            Command::Categories => run_categories(&engine).await,
            Command::Pick(opts) => run_pick(&engine, opts).await,
            Command::Wear(opts) => run_wear(&engine, opts).await,
            Command::Shuffle(opts) => run_shuffle(engine, opts).await,
            Command::Reset(opts) => run_reset(&engine, opts).await,
            Command::Worn => run_worn(&engine).await,
            Command::Exclude(opts) => run_exclude(&mut engine, opts).await,
            Command::Include(opts) => run_include(&mut engine, opts).await,
            Command::Root(opts) => run_root(&mut engine, opts).await,
        }
    }

    async fn engine(&self) -> Result<SelectionEngine> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let cache_path = match &self.cache {
            Some(path) => path.clone(),
            None => default_rotation_cache_path()?,
        };

        let config_file = ConfigFile::new(config_path);
        let config = config_file.load().await?;
        Ok(SelectionEngine::new(config, JsonRotationStore::new(cache_path)).with_config_file(config_file))
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List categories with their rotation progress.
    #[command(override_usage = "wardrobe categories [options]")]
    Categories,

    /// Pick random unworn outfit without wearing it.
    #[command(override_usage = "wardrobe pick [options] [<category>]")]
    Pick(PickOptions),

    /// Mark outfit as worn.
    #[command(override_usage = "wardrobe wear [options] <category> <file>")]
    Wear(WearOptions),

    /// Draw several outfits without repeats.
    #[command(override_usage = "wardrobe shuffle [options] [<category>]")]
    Shuffle(ShuffleOptions),

    /// Forget rotation progress.
    #[command(override_usage = "wardrobe reset [options] (<category> | --all | --purge)")]
    Reset(ResetOptions),

    /// List worn outfits of every category.
    #[command(override_usage = "wardrobe worn [options]")]
    Worn,

    /// Leave category out when picking across categories.
    #[command(override_usage = "wardrobe exclude [options] <category>")]
    Exclude(CategoryOptions),

    /// Take excluded category back in.
    #[command(override_usage = "wardrobe include [options] <category>")]
    Include(CategoryOptions),

    /// Move wardrobe to a new root directory.
    #[command(override_usage = "wardrobe root [options] <path>")]
    Root(RootOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct PickOptions {
    /// Category to pick from instead of any category.
    #[arg(value_name = "category")]
    pub category: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct WearOptions {
    /// Category of outfit.
    #[arg(required = true, value_name = "category")]
    pub category: String,

    /// File name of outfit.
    #[arg(required = true, value_name = "file")]
    pub file: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShuffleOptions {
    /// Category to draw from instead of any category.
    #[arg(value_name = "category")]
    pub category: Option<String>,

    /// Number of outfits to draw.
    #[arg(short, long, default_value_t = 3, value_name = "count")]
    pub count: usize,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CategoryOptions {
    /// Name of category.
    #[arg(required = true, value_name = "category")]
    pub category: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RootOptions {
    /// Path to new wardrobe root.
    #[arg(required = true, value_name = "path")]
    pub path: PathBuf,

    /// Keep rotation cache of previous root.
    #[arg(short, long)]
    pub keep_cache: bool,
}

#[derive(Args, Clone, Debug)]
#[group(required = true, multiple = false)]
struct ResetOptions {
    /// Category to reset.
    #[arg(value_name = "category")]
    pub category: Option<String>,

    /// Reset every category.
    #[arg(short, long)]
    pub all: bool,

    /// Delete rotation cache altogether.
    #[arg(short, long)]
    pub purge: bool,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run().await {
        error!("{error:?}");
        let code = error
            .downcast_ref::<EngineError>()
            .map_or(1, EngineError::exit_code);
        exit(code);
    }

    exit(0)
}

async fn run() -> Result<()> {
    Cli::parse().run().await
}

async fn run_categories(engine: &SelectionEngine) -> Result<()> {
    for info in engine.category_info().await? {
        let name = info.category.name();
        if info.is_selectable() {
            let progress = engine.progress(name).await?;
            println!(
                "{name}: {}/{} worn ({:.0}%)",
                progress.worn,
                progress.total,
                progress.progress() * 100.0
            );
        } else {
            println!("{name}: {}", info.state);
        }
    }

    Ok(())
}

async fn run_pick(engine: &SelectionEngine, opts: PickOptions) -> Result<()> {
    let pick = match opts.category {
        Some(category) => engine.pick_from_category(&category).await?,
        None => engine.pick_across_categories().await?,
    };

    match pick {
        Some(item) => println!("{item}"),
        None => info!("nothing available to wear"),
    }

    Ok(())
}

async fn run_wear(engine: &SelectionEngine, opts: WearOptions) -> Result<()> {
    let category = engine.find_category(&opts.category).await?;
    let item = Item::new(opts.file, category);
    match engine.mark_worn(&item).await? {
        WornOutcome::Marked => info!("wearing {item}"),
        WornOutcome::AlreadyWorn => info!("{item} was already worn"),
        WornOutcome::RotationCompleted => {
            info!("wearing {item}, every outfit of {:?} has been worn, starting over", opts.category)
        }
    }

    Ok(())
}

async fn run_shuffle(engine: SelectionEngine, opts: ShuffleOptions) -> Result<()> {
    let mut session = SessionTracker::new(engine);
    for _ in 0..opts.count {
        let pick = match &opts.category {
            Some(category) => session.next_unique_in(category).await?,
            None => session.next_unique().await?,
        };

        let Some(item) = pick else {
            info!("nothing available to wear");
            break;
        };
        println!("{item}");
    }

    Ok(())
}

async fn run_reset(engine: &SelectionEngine, opts: ResetOptions) -> Result<()> {
    if opts.purge {
        engine.purge().await?;
    } else if opts.all {
        engine.reset_all().await?;
    } else if let Some(category) = opts.category {
        engine.reset_category(&category).await?;
    }

    Ok(())
}

async fn run_worn(engine: &SelectionEngine) -> Result<()> {
    for (category, worn) in engine.worn_summary().await? {
        println!("{category}:");
        for file_name in worn {
            println!("  {file_name}");
        }
    }

    Ok(())
}

async fn run_exclude(engine: &mut SelectionEngine, opts: CategoryOptions) -> Result<()> {
    engine.exclude_category(&opts.category).await?;
    Ok(())
}

async fn run_include(engine: &mut SelectionEngine, opts: CategoryOptions) -> Result<()> {
    engine.include_category(&opts.category).await?;
    Ok(())
}

async fn run_root(engine: &mut SelectionEngine, opts: RootOptions) -> Result<()> {
    if !engine.change_root(&opts.path, !opts.keep_cache).await? {
        info!("wardrobe root already at {:?}", opts.path.display());
    }

    Ok(())
}
