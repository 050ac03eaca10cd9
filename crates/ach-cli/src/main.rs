use std::io;
use std::path::Path;
use std::sync::Arc;

use ach_cli::commands::{games, import, locate, reset, show, sync, watch};
use ach_cli::{Cli, Commands, Config, GamesAction, MetadataDir};
use ach_core::Locator;
use ach_db::{Database, SharedDatabase};
use ach_watch::AchievementObserver;
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Open the database, ensuring the parent directory exists.
fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

fn build_observer(config: &Config) -> Result<AchievementObserver> {
    let db = Arc::new(SharedDatabase::new(open_database(config)?));
    Ok(AchievementObserver::new(
        Arc::new(MetadataDir::new(&config.metadata_dir)),
        db.clone(),
        db,
        Locator::new(config.roots()),
        config.watch_config(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Games(action)) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            match action {
                GamesAction::Add { id, title, shop } => games::add(&mut stdout, &db, id, title, *shop)?,
                GamesAction::Remove { id } => games::remove(&mut stdout, &db, id)?,
                GamesAction::List { json } => games::list(&mut stdout, &db, *json)?,
            }
        }
        Some(Commands::Locate {
            cracker,
            game,
            json,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let locator = Locator::new(config.roots());
            locate::run(&mut stdout, &locator, *cracker, game.as_deref(), *json)?;
        }
        Some(Commands::Import) => {
            let config = load_config(cli.config.as_deref())?;
            let observer = build_observer(&config)?;
            import::run(&mut stdout, &observer).await?;
        }
        Some(Commands::Sync { game }) => {
            let config = load_config(cli.config.as_deref())?;
            let observer = build_observer(&config)?;
            sync::run(&mut stdout, &observer, game).await?;
        }
        Some(Commands::Show { game, json }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            show::run(&mut stdout, &db, game, *json)?;
        }
        Some(Commands::Reset { game }) => {
            let config = load_config(cli.config.as_deref())?;
            let db = open_database(&config)?;
            reset::run(&mut stdout, &db, game)?;
        }
        Some(Commands::Watch { games }) => {
            let config = load_config(cli.config.as_deref())?;
            let observer = build_observer(&config)?;
            watch::run(&mut stdout, &observer, games).await?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
