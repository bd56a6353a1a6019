//! Rabt - Unified CLI
//!
//! Terminal play, offline level generation and the campaign listing.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use rabt::{
    BellSink, DirectoryPuzzleProvider, FileStore, GameDriver, LlmClient, LlmPuzzleProvider, Mixer,
    ProfileService, PuzzleProvider, RabtConfig, console,
};
use rabt_core::{GameMachine, LevelId, Tier, campaign};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = match cli.command {
        Command::Play { .. } => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = RabtConfig::load_or_default(&cli.config)?;

    match cli.command {
        Command::Play {
            tier,
            index,
            levels_dir,
            seed,
            guest,
        } => {
            let start = tier.map(|tier| LevelId::new(tier, index)).transpose()?;
            let config = match levels_dir {
                Some(dir) => config.with_levels_dir(dir),
                None => config,
            };
            run_play(config, start, seed, guest).await
        }
        Command::Generate { out, tier, index } => run_generate(config, out, tier, index).await,
        Command::Levels => {
            run_levels();
            Ok(())
        }
    }
}

/// Play in the terminal
#[instrument(skip(config))]
async fn run_play(
    config: RabtConfig,
    start: Option<LevelId>,
    seed: Option<u64>,
    guest: bool,
) -> Result<()> {
    let provider: Arc<dyn PuzzleProvider> = match config.levels_dir() {
        Some(dir) => {
            info!(dir = %dir.display(), "Playing offline levels");
            Arc::new(DirectoryPuzzleProvider::new(dir))
        }
        None => {
            let llm = config
                .create_llm_config()
                .context("No levels directory and no API key for generation")?;
            Arc::new(LlmPuzzleProvider::new(LlmClient::new(llm)))
        }
    };

    let machine = match seed {
        Some(seed) => GameMachine::new(StdRng::seed_from_u64(seed), *config.timings()),
        None => GameMachine::from_entropy(*config.timings()),
    };
    let driver = GameDriver::new(machine, provider, Mixer::new(Box::new(BellSink)));

    if guest {
        return console::run(driver, None, start).await;
    }
    let profiles = ProfileService::new(Arc::new(FileStore::new(config.storage_path())));
    let driver = driver.with_profiles(profiles.clone());
    console::run(driver, Some(profiles), start).await
}

/// Generate level files for offline play
#[instrument(skip(config))]
async fn run_generate(
    config: RabtConfig,
    out: std::path::PathBuf,
    tier: Option<Tier>,
    index: Option<u8>,
) -> Result<()> {
    let generator = LlmPuzzleProvider::new(LlmClient::new(config.create_llm_config()?));
    let store = DirectoryPuzzleProvider::new(&out);
    let mut rng = StdRng::from_entropy();

    let levels: Vec<LevelId> = campaign()
        .filter(|level| tier.is_none_or(|tier| level.tier() == tier))
        .filter(|level| index.is_none_or(|index| level.index() == index))
        .collect();
    if levels.is_empty() {
        anyhow::bail!("No level matches the requested tier and index");
    }

    let mut failures = 0;
    for level in levels {
        let generated = match generator.generate(level).await {
            Ok(generated) => generated,
            Err(e) => {
                warn!(%level, error = %e, "Generation failed");
                failures += 1;
                continue;
            }
        };
        if let Err(e) = generated.clone().into_puzzle(level, &mut rng) {
            warn!(%level, error = %e, "Generated level failed validation");
            failures += 1;
            continue;
        }
        let path = store.store(level, &generated).await?;
        println!("{} -> {}", level, path.display());
    }

    if failures > 0 {
        anyhow::bail!("{} level(s) could not be generated", failures);
    }
    Ok(())
}

/// List the campaign levels
fn run_levels() {
    print!("{}", console::render_levels(None));
}
