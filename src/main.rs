//! rust-selfplay - command-line front end for the trainer
//!
//! Each invocation builds a trainer for one reference game, optionally seeds
//! the population from a saved evaluator, runs one command and optionally
//! saves the champion.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use rust_selfplay::games::{ConnectFour, TicTacToe};
use rust_selfplay::mcts::{MCTSSearch, SearchBudget};
use rust_selfplay::nn::{persist, ConstantEvaluator, Evaluator};
use rust_selfplay::training::{Trainer, TrainerConfig};
use rust_selfplay::GameState;

#[derive(Parser, Debug)]
#[command(name = "rust-selfplay", version, about = "Self-play trainer with MCTS and evolved evaluators")]
struct Cli {
    /// Game to train on
    #[arg(long, value_enum, default_value_t = GameKind::TicTacToe)]
    game: GameKind,

    /// Trainer configuration (JSON); missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed the population from a saved evaluator
    #[arg(long)]
    load: Option<PathBuf>,

    /// Save the champion into this directory when done
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GameKind {
    TicTacToe,
    ConnectFour,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evolve the population by self-play
    Train {
        #[arg(long, default_value_t = 100)]
        generations: usize,
    },
    /// Evolve the population against a random mover
    TrainRandom {
        #[arg(long, default_value_t = 100)]
        generations: usize,
    },
    /// Gradient-descent self-play
    TrainGd {
        #[arg(long, default_value_t = 10)]
        generations: usize,
    },
    /// Play the loaded champion against a random mover
    Benchmark {
        #[arg(long, default_value_t = 1000)]
        games: usize,
    },
    /// Fuzz the loaded champion's output range and install it as its bounds
    Fuzz {
        #[arg(long, default_value_t = 1000)]
        games: usize,
    },
    /// Search a position and print the root statistics
    Search {
        /// Root visit budget
        #[arg(long, default_value_t = 10_000)]
        visits: u32,

        /// Moves applied to the starting position, comma separated
        #[arg(long, value_delimiter = ',')]
        moves: Vec<u32>,
    },
    /// List saved evaluators for the game
    ListSaves {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<TrainerConfig> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => TrainerConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    config.validate().context("invalid trainer configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = load_config(cli.config.as_deref(), cli.seed)?;
    info!(game = ?cli.game, "starting");

    match cli.game {
        GameKind::TicTacToe => run(TicTacToe::new(), config, &cli),
        GameKind::ConnectFour => run(ConnectFour::new(), config, &cli),
    }
}

fn run<G: GameState>(base: G, config: TrainerConfig, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Train { generations } => {
            let mut trainer = open_trainer(base, config, cli.load.as_deref())?;
            println!("{}", trainer.train_generations(*generations)?);
            finish(&trainer, cli.save_dir.as_deref())
        }
        Command::TrainRandom { generations } => {
            let mut trainer = open_trainer(base, config, cli.load.as_deref())?;
            println!("{}", trainer.train_against_random(*generations)?);
            finish(&trainer, cli.save_dir.as_deref())
        }
        Command::TrainGd { generations } => {
            let mut trainer = open_trainer(base, config, cli.load.as_deref())?;
            println!("{}", trainer.train_gradient_descent(*generations)?);
            finish(&trainer, cli.save_dir.as_deref())
        }
        Command::Benchmark { games } => {
            let mut trainer = open_trainer(base, config, cli.load.as_deref())?;
            let report = trainer
                .benchmark_champion(*games)
                .context("benchmark needs a champion; pass --load")?;
            println!("{report}");
            Ok(())
        }
        Command::Fuzz { games } => {
            let mut trainer = open_trainer(base, config, cli.load.as_deref())?;
            match trainer.fuzz_champion_bounds(*games).context("fuzzing needs a champion; pass --load")? {
                Some(bounds) => println!("Clamping range updated to [{}, {}]", bounds.min, bounds.max),
                None => println!("No positions observed; bounds unchanged"),
            }
            finish(&trainer, cli.save_dir.as_deref())
        }
        Command::Search { visits, moves } => search(base, &config, cli.load.as_deref(), *visits, moves),
        Command::ListSaves { dir } => {
            let saves =
                persist::list_saves(dir, base.name()).with_context(|| format!("failed to list {}", dir.display()))?;
            if saves.is_empty() {
                println!("No saved networks found.");
            }
            for path in saves {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Trainer seeded from `load`, or with a fresh population.
fn open_trainer<G: GameState>(base: G, config: TrainerConfig, load: Option<&Path>) -> Result<Trainer<G>> {
    let mut trainer = Trainer::new(base, config).context("failed to create trainer")?;
    match load {
        Some(path) => {
            trainer
                .load_population(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => trainer.initialize_population(),
    }
    Ok(trainer)
}

fn finish<G: GameState>(trainer: &Trainer<G>, save_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = save_dir {
        let path = trainer.save_champion(dir).context("failed to save champion")?;
        println!("Saved current champion as {}", path.display());
    }
    Ok(())
}

fn search<G: GameState>(
    mut game: G,
    config: &TrainerConfig,
    load: Option<&Path>,
    visits: u32,
    moves: &[u32],
) -> Result<()> {
    for &mv in moves {
        if !game.make_move(mv) {
            bail!("move {mv} rejected");
        }
    }

    let evaluator: Box<dyn Evaluator> = match load {
        Some(path) => {
            let loaded = persist::load(path).with_context(|| format!("failed to load {}", path.display()))?;
            loaded
                .ensure_input_size(game.board_state().len())
                .with_context(|| format!("{} cannot evaluate {}", path.display(), game.name()))?;
            if !loaded.bounds_known() {
                warn!(id = %loaded.id(), "bounds are not fuzzed for this evaluator; run `fuzz` first");
            }
            Box::new(loaded)
        }
        None => Box::new(ConstantEvaluator::uniform(0.0)),
    };

    let mut search = MCTSSearch::new(evaluator.as_ref(), config.mcts.clone());
    let Some(result) = search.search(&game, SearchBudget::Visits(visits)) else {
        println!("No legal moves ({:?})", game.winner());
        return Ok(());
    };

    println!(
        "Best move: {} (evaluation {:.3}, {} visits)",
        result.best_move, result.evaluation, result.root_visits
    );
    for child in &result.children {
        println!("  move {:>3}: {:>7} visits, mean {:+.3}", child.mv, child.visits, child.mean);
    }
    println!(
        "{} simulations, {:.0}/s, {} workers",
        result.stats.simulations,
        result.stats.simulations_per_second(),
        result.stats.workers
    );
    Ok(())
}
