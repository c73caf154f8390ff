#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Castle Raid experience.

mod session;
mod terminal;

use std::io;

use anyhow::{Context, Result};
use castle_raid_core::{Grid, DEFAULT_ACTIONS_PER_TURN};
use castle_raid_rendering::{GridPresentation, RenderingBackend};
use castle_raid_rendering_macroquad::MacroquadBackend;
use castle_raid_system_bootstrap::Bootstrap;
use castle_raid_world::{Match, MatchConfig};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{session::Session, terminal::TerminalBackend};

/// Cell side length used by the ASCII backend, where only the grid dimensions matter.
const TERMINAL_CELL_LENGTH: f32 = 1.0;

#[derive(Debug, Parser)]
#[command(name = "castle-raid", version, about = "Turn-based grid tactics: unicorns against robots")]
struct Args {
    /// Frontend used to present the match.
    #[arg(long, value_enum, default_value_t = Backend::Window)]
    backend: Backend,
    /// Number of grid columns.
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u16).range(1..))]
    width: u16,
    /// Number of grid rows.
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u16).range(1..))]
    height: u16,
    /// Number of unicorns in the roster.
    #[arg(long, default_value_t = 5)]
    unicorns: usize,
    /// Number of robots in the roster.
    #[arg(long, default_value_t = 5)]
    robots: usize,
    /// Actions granted to an actor at the start of each turn.
    #[arg(long, default_value_t = DEFAULT_ACTIONS_PER_TURN)]
    actions_per_turn: u32,
    /// Seed for placement and key assignment; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Log filter directive used when `RUST_LOG` is unset.
    #[arg(long, default_value = "warn")]
    log_filter: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Macroquad window.
    Window,
    /// Line-oriented ASCII frontend on stdin/stdout.
    Terminal,
}

/// Entry point for the Castle Raid command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_filter)?;

    let grid = Grid::from_dimensions(args.width, args.height)
        .context("grid dimensions must be positive")?;
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = MatchConfig::default()
        .with_actions_per_turn(args.actions_per_turn)
        .with_seed(seed);
    let roster = Bootstrap.default_roster(args.unicorns, args.robots);

    let mut setup_events = Vec::new();
    let game = Match::setup(roster, grid, config, &mut setup_events)
        .with_context(|| format!("failed to set up a match with seed {seed}"))?;
    tracing::info!(seed, width = args.width, height = args.height, "match ready");

    let mut session = Session::new(game, &setup_events);
    println!("{}", session.welcome_banner());

    match args.backend {
        Backend::Window => {
            let presentation = session
                .presentation(GridPresentation::DEFAULT_CELL_LENGTH)
                .context("failed to describe the scene")?;
            MacroquadBackend::new()
                .with_vsync(true)
                .run(presentation, move |input, scene| session.frame(input, scene))
        }
        Backend::Terminal => {
            let presentation = session
                .presentation(TERMINAL_CELL_LENGTH)
                .context("failed to describe the scene")?;
            TerminalBackend::new(io::stdin().lock(), io::stdout())
                .run(presentation, move |input, scene| session.frame(input, scene))
        }
    }
}

fn init_logging(fallback_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .with_context(|| format!("invalid log filter `{fallback_filter}`"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .context("failed to install the tracing subscriber")
}
