//! Chess-Crawler: combat core and MCTS AI for a chess-board tactics game.
//!
//! ## Usage
//!
//! - `chess-crawler` - Show a demo
//! - `chess-crawler bridge` - Serve the host bridge on stdin/stdout
//! - `chess-crawler search <board.json>` - Recommend the AI's action for a board
//! - `chess-crawler demo` - Run the MCTS demo

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chess_crawler::ability::AbilityCatalog;
use chess_crawler::bridge::Bridge;
use chess_crawler::config::SearchConfig;
use chess_crawler::constants::{
    EXPLORATION_CONSTANT, ITERATION_GOAL, MAX_ROLLOUT_DEPTH, NUM_SHARDS, SEED, TIME_LIMIT_MS,
};
use chess_crawler::mcts::dump_actions;
use chess_crawler::piece::Piece;
use chess_crawler::session::Session;
use chess_crawler::state::Actor;
use chess_crawler::stats::StatBlock;

/// Chess-Crawler: a chess-board tactics combat engine
#[derive(Parser)]
#[command(name = "chess-crawler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the line-oriented host bridge on stdin/stdout
    Bridge {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Recommend the AI's action for a board file
    Search {
        /// JSON array of 64 square descriptors
        board: PathBuf,
        /// JSON ability catalog (defaults to the built-in abilities)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Print per-action statistics to stderr
        #[arg(long)]
        dump: bool,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Run a simple demo of the engine
    Demo,
}

#[derive(Args, Clone, Debug)]
struct SearchArgs {
    /// Total iterations across all shards
    #[arg(long, default_value_t = ITERATION_GOAL)]
    iterations: u32,
    /// Time limit for the whole search, in milliseconds
    #[arg(long, default_value_t = TIME_LIMIT_MS)]
    time_limit_ms: u64,
    /// Maximum plies per rollout
    #[arg(long, default_value_t = MAX_ROLLOUT_DEPTH)]
    max_depth: u32,
    /// Number of parallel search shards
    #[arg(long, default_value_t = NUM_SHARDS)]
    shards: usize,
    /// Base random seed
    #[arg(long, default_value_t = SEED)]
    seed: u64,
    /// UCT exploration constant
    #[arg(long, default_value_t = EXPLORATION_CONSTANT)]
    exploration: f64,
    /// Let every shard search all root actions
    #[arg(long)]
    no_partition: bool,
}

impl From<SearchArgs> for SearchConfig {
    fn from(args: SearchArgs) -> Self {
        SearchConfig::default()
            .with_iteration_goal(args.iterations)
            .with_time_limit(Duration::from_millis(args.time_limit_ms))
            .with_max_depth(args.max_depth)
            .with_shards(args.shards)
            .with_seed(args.seed)
            .with_exploration(args.exploration)
            .with_partition_root(!args.no_partition)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chess_crawler=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Bridge { search }) => {
            let mut bridge = Bridge::with_config(search.into());
            bridge.run().context("bridge I/O failed")?;
        }
        Some(Commands::Search {
            board,
            catalog,
            dump,
            search,
        }) => run_search(&board, catalog.as_deref(), dump, search.into())?,
        Some(Commands::Demo) | None => run_demo()?,
    }
    Ok(())
}

fn run_search(
    board: &std::path::Path,
    catalog: Option<&std::path::Path>,
    dump: bool,
    config: SearchConfig,
) -> Result<()> {
    let catalog = match catalog {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading catalog {}", path.display()))?;
            AbilityCatalog::from_json(&json)
                .with_context(|| format!("parsing catalog {}", path.display()))?
        }
        None => AbilityCatalog::standard(),
    };
    let json = fs::read_to_string(board)
        .with_context(|| format!("reading board {}", board.display()))?;

    let mut session = Session::new(catalog, config);
    session
        .load_board(&json)
        .with_context(|| format!("parsing board {}", board.display()))?;
    session.begin_combat()?;
    // The player moves first; hand the turn to the AI.
    if session.state().is_some_and(|s| s.actor() == Actor::Player) {
        session.pass_turn()?;
    }

    let report = session.recommend()?;
    if dump {
        dump_actions(&report.actions);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("Chess-Crawler: MCTS Combat Engine\n");

    let mut session = Session::new(
        AbilityCatalog::standard(),
        SearchConfig::default().with_iteration_goal(2_000),
    );
    session.load_board(DEMO_BOARD)?;
    let hit = session
        .catalog()
        .lookup("weapon_hit")
        .context("standard catalog lacks weapon_hit")?;
    let knight = Piece::combatant("Knight", Actor::Player, 2, vec![hit], StatBlock::with_health(30.0));
    session.deploy(57, knight)?;
    session.begin_combat()?;

    println!("=== Board ===");
    if let Some(state) = session.state() {
        println!("{}", state.board());
    }

    // The player advances towards the goblins, then the AI answers.
    for turn in 0..3 {
        let actions = session.legal_actions()?;
        let Some(&action) = actions.first() else {
            break;
        };
        session.apply_action(action)?;
        println!("Player: {action}");

        match session.ai_turn() {
            Ok(Some(reply)) => println!("AI:     {reply}"),
            Ok(None) => println!("AI:     pass"),
            Err(e) => {
                info!(turn, "demo stopped: {e}");
                break;
            }
        }
    }

    println!("\n=== Board ===");
    if let Some(state) = session.state() {
        println!("{}", state.board());
    }
    println!("{}", session.status());
    Ok(())
}

const DEMO_BOARD: &str = r#"[
    false, false, {"type": "Enemy", "name": "Goblin", "moveRange": 1, "abilities": ["weapon_hit"], "stats": {"health": {"base": 20, "flatBonus": 0, "percentBonus": 0}}}, false, false, {"type": "Enemy", "name": "Archer", "moveRange": 1, "abilities": ["bow_shot"], "stats": {"health": {"base": 12, "flatBonus": 0, "percentBonus": 0}, "dodge": {"base": 10, "flatBonus": 0, "percentBonus": 0}}}, false, false,
    false, false, false, false, false, false, false, false,
    false, false, {"type": "Terrain"}, {"type": "Terrain"}, false, false, false, false,
    false, false, false, false, false, false, false, false,
    false, false, false, false, false, {"type": "Terrain"}, false, false,
    false, false, false, false, false, false, false, false,
    false, false, false, false, false, false, false, false,
    {"type": "PlayerArea"}, {"type": "PlayerArea"}, {"type": "PlayerArea"}, false, false, false, false, false
]"#;
