//! Streets CLI - Judge, play and score turns from JSON snapshots.
//!
//! Every command reads one JSON document from a file, or from stdin when the
//! path is `-`, and writes its answer to stdout.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use streets_core::{
    standings, strategy_for, validate_move, GameState, PlayerState, SearchSettings, StrategyKind,
};
use tracing::{debug, info, warn};

/// Streets - rules engine for a street-building roll-and-write game
#[derive(Parser, Debug)]
#[command(name = "streets")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a turn: input is `[game, before, after]`, prints true or false
    Validate {
        /// JSON file, or - for stdin
        input: PathBuf,
    },

    /// Pick the next move: input is `[game, player]`, prints the new sheet
    Search {
        /// JSON file, or - for stdin
        input: PathBuf,

        /// Seed for tie breaking (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Move strategy (overrides the settings file)
        #[arg(long)]
        strategy: Option<StrategyArg>,

        /// Score candidates on the calling thread only
        #[arg(long)]
        sequential: bool,

        /// Search settings as JSON
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Score a round: input is `[player, ...]`, prints the scores
    Score {
        /// JSON file, or - for stdin
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Score every candidate move
    Smart,
    /// Take the first house that fits
    FirstFit,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Smart => StrategyKind::Smart,
            StrategyArg::FirstFit => StrategyKind::FirstFit,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // Silent by default, only show warnings and errors
    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Commands::Validate { input } => validate(&input),
        Commands::Search {
            input,
            seed,
            strategy,
            sequential,
            settings,
        } => {
            let mut config = match settings {
                Some(path) => read_json::<SearchSettings>(&path)?,
                None => SearchSettings::default(),
            };
            if let Some(strategy) = strategy {
                config = config.with_strategy(strategy.into());
            }
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            if sequential {
                config = config.sequential();
            }
            search(&input, &config)
        }
        Commands::Score { input } => score(&input),
    }
}

fn validate(input: &Path) -> Result<(), Box<dyn Error>> {
    let (game, before, after): (GameState, PlayerState, PlayerState) = read_json(input)?;
    match validate_move(&game, &before, &after) {
        Ok(delta) => {
            debug!(?delta, "turn accepted");
            println!("true");
        }
        Err(err) => {
            warn!("turn rejected: {}", err);
            println!("false");
        }
    }
    Ok(())
}

fn search(input: &Path, settings: &SearchSettings) -> Result<(), Box<dyn Error>> {
    let (game, state): (GameState, PlayerState) = read_json(input)?;
    let strategy = strategy_for(settings)?;
    info!(strategy = strategy.name(), "searching for a move");

    let next = strategy.next_move(&game, &state)?;
    println!("{}", serde_json::to_string(&next)?);
    Ok(())
}

fn score(input: &Path) -> Result<(), Box<dyn Error>> {
    let players: Vec<PlayerState> = read_json(input)?;
    println!("{}", serde_json::to_string(&standings(&players))?);
    Ok(())
}

/// Read and decode a JSON document from `path`, or stdin for `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?
    };
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid input in {}: {}", path.display(), e).into())
}
