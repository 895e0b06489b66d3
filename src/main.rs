use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use grid_snake::game::{FileScoreStore, GameConfig, GameMode};
use grid_snake::modes::PlayMode;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "grid_snake")]
#[command(version, about = "Grid snake with classic, AI, speed-up and obstacle modes")]
struct Cli {
    /// Skip the menu and play this mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Best-score and history file
    #[arg(long, default_value = "scores.txt")]
    scores: PathBuf,

    /// JSON game configuration; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output file (the terminal is taken by the game)
    #[arg(long, default_value = "grid_snake.log")]
    log_file: PathBuf,

    /// Seed for item and obstacle placement
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Single player
    Classic,
    /// Against a greedy AI snake
    Ai,
    /// Tick rate ramps up over time
    #[value(name = "speedup")]
    SpeedUp,
    /// Obstacles keep appearing
    Obstacle,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Classic => GameMode::Classic,
            Mode::Ai => GameMode::Ai,
            Mode::SpeedUp => GameMode::SpeedUp,
            Mode::Obstacle => GameMode::Obstacle,
        }
    }
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create log file {:?}", path))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file)?;

    let config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let store = FileScoreStore::open(&cli.scores);
    tracing::info!(scores = ?store.path(), "starting grid snake");

    let mut play = PlayMode::new(config, store, cli.mode.map(GameMode::from));
    if let Some(seed) = cli.seed {
        play.reseed(seed);
    }
    play.run().await?;

    tracing::info!("bye");
    Ok(())
}
