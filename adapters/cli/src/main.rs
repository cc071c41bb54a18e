#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless harness that plays a Turf match against an idle player.

use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use turf_core::{Difficulty, Event, Faction};
use turf_session::{Session, SessionConfig};
use turf_world::{query, WorldConfig, DEFAULT_COLUMNS, DEFAULT_ROWS};

/// Runs the opponent against a player who never acts and reports the result.
#[derive(Debug, Parser)]
#[command(name = "turf", version, about)]
struct Args {
    /// Opponent tier.
    #[arg(long, value_enum, default_value_t = Tier::Normal)]
    difficulty: Tier,
    /// Seed for the opponent's decisions.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulated seconds before giving up.
    #[arg(long, default_value_t = 600)]
    seconds: u64,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,
    /// Grid columns.
    #[arg(long, default_value_t = DEFAULT_COLUMNS)]
    columns: u32,
    /// Grid rows.
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    rows: u32,
    /// Print the final ownership map.
    #[arg(long)]
    map: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Tier {
    Easy,
    Normal,
    Hard,
}

impl From<Tier> for Difficulty {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Easy => Difficulty::Easy,
            Tier::Normal => Difficulty::Normal,
            Tier::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    frames: u64,
    captures: usize,
    opponent_spawns: usize,
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let args = Args::parse();
    ensure!(args.fps > 0, "--fps must be at least 1");

    let config = SessionConfig {
        world: WorldConfig::with_grid(args.columns, args.rows),
        difficulty: args.difficulty.into(),
        seed: args.seed,
    };
    let mut session = Session::new(config).context("invalid world configuration")?;
    let tally = run(&mut session, &args);

    println!("{}", summary(&session, &tally, args.fps));
    if args.map {
        print!("{}", ownership_map(&session));
    }
    Ok(())
}

fn run(session: &mut Session, args: &Args) -> Tally {
    let dt = Duration::from_secs(1) / args.fps;
    let frames = args.seconds.saturating_mul(u64::from(args.fps));
    let mut tally = Tally::default();
    let mut events = Vec::new();

    while tally.frames < frames && session.winner().is_none() {
        events.clear();
        session.tick(dt, &mut events);
        tally.frames += 1;
        for event in &events {
            match event {
                Event::CellCaptured { .. } => tally.captures += 1,
                Event::UnitSpawned {
                    faction: Faction::Opponent,
                    ..
                } => tally.opponent_spawns += 1,
                _ => {}
            }
        }
    }
    tally
}

fn summary(session: &Session, tally: &Tally, fps: u32) -> String {
    let world = session.world();
    let territory = query::territory_view(world);
    let outcome = match session.winner() {
        Some(Faction::Player) => "player wins".to_owned(),
        Some(faction) => format!("{faction:?} wins").to_lowercase(),
        None => "no winner".to_owned(),
    };
    format!(
        "{outcome} after {:.1}s ({} frames)\n\
         cells: player {} / opponent {} / neutral {}\n\
         captures: {}, opponent spawns: {}\n\
         resources: player {}, opponent {}",
        tally.frames as f64 / f64::from(fps),
        tally.frames,
        territory.count(Faction::Player),
        territory.count(Faction::Opponent),
        territory.count(Faction::Neutral),
        tally.captures,
        tally.opponent_spawns,
        query::resources(world),
        session.opponent().ledger().balance(),
    )
}

fn ownership_map(session: &Session) -> String {
    let territory = query::territory_view(session.world());
    let (columns, _) = territory.dimensions();
    let cells: Vec<char> = territory
        .iter()
        .map(|(_, owner)| match owner {
            Faction::Player => 'P',
            Faction::Opponent => 'O',
            Faction::Neutral => '.',
        })
        .collect();
    let width = usize::try_from(columns).unwrap_or(1).max(1);
    let mut map = String::new();
    // Highest row first so the opponent's home sits at the top.
    for row in cells.chunks(width).rev() {
        map.extend(row.iter());
        map.push('\n');
    }
    map
}
