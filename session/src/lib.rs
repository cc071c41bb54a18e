#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A single Turf match: one world and one opponent driven in lockstep.
//!
//! Hosts construct a [`Session`], call [`Session::tick`] once per frame, and
//! forward player intents between ticks. Sessions share nothing, so any number
//! of them may run side by side.

use std::time::Duration;

use glam::Vec2;
use turf_core::{ActionMode, CellCoord, Command, Difficulty, Event, Faction, UnitId, UnitKind};
use turf_system_opponent::{Config as OpponentConfig, Opponent};
use turf_world::{self as world, query, ConfigError, World, WorldConfig, DEFAULT_UNIT_SIZE};

/// Parameters for a match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Grid and movement parameters.
    pub world: WorldConfig,
    /// Opponent tier.
    pub difficulty: Difficulty,
    /// Seed for every random decision the opponent makes.
    pub seed: u64,
}

impl SessionConfig {
    /// Default world at the provided tier and seed.
    #[must_use]
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            world: WorldConfig::default(),
            difficulty,
            seed,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Difficulty::default(), 0)
    }
}

/// Explicit simulation context owning the authoritative world and its rival.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    world: World,
    opponent: Opponent,
}

impl Session {
    /// Builds a session after validating the world configuration.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let world = World::with_config(config.world)?;
        log::info!(
            "session started at {:?} difficulty with seed {:#x}",
            config.difficulty,
            config.seed
        );
        Ok(Self {
            opponent: new_opponent(&config),
            world,
            config,
        })
    }

    /// Configuration the session was built with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read-only world for rendering and queries.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Read-only opponent state.
    #[must_use]
    pub const fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    /// Advances the match by one frame.
    ///
    /// The world accrues and checks for a winner, the opponent decides and its
    /// commands are applied, then every unit ticks and the accrual rate is
    /// recomputed. Collections made during the unit phase are fed back to the
    /// opponent's ledger.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.world.begin_tick(dt, out_events);

        let territory = query::territory_view(&self.world);
        let units = query::unit_view(&self.world);
        let mut commands = Vec::new();
        self.opponent.handle(dt, &territory, &units, &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, out_events);
        }

        let unit_phase = out_events.len();
        self.world.finish_tick(dt, out_events);
        self.opponent.observe(&out_events[unit_phase..]);
    }

    /// Restores the world and replaces the opponent with a freshly seeded one.
    pub fn reset_game(&mut self, out_events: &mut Vec<Event>) {
        self.world.reset_game(out_events);
        self.opponent = new_opponent(&self.config);
    }

    /// Restarts the match at another tier, keeping the seed.
    pub fn restart_with_difficulty(&mut self, difficulty: Difficulty, out_events: &mut Vec<Event>) {
        self.config.difficulty = difficulty;
        self.reset_game(out_events);
    }

    /// Summons a player unit onto a cell the player owns.
    pub fn spawn_player_unit(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        mode: ActionMode,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        self.world
            .spawn_unit_at_cell(kind, cell, Faction::Player, mode, out_events)
    }

    /// Summons a player unit at a world position, such as the point of a tap.
    pub fn spawn_player_unit_at(
        &mut self,
        kind: UnitKind,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        self.world
            .spawn_unit(kind, position, Faction::Player, DEFAULT_UNIT_SIZE, out_events)
    }

    /// Sends a unit toward a cell.
    pub fn set_unit_target(
        &mut self,
        unit: UnitId,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> bool {
        self.world.set_unit_target(unit, cell, out_events)
    }

    /// Flips a unit between collecting and attacking.
    pub fn toggle_unit_mode(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        self.world.toggle_unit_mode(unit, out_events)
    }

    /// Executes a host command.
    ///
    /// Ticks and resets go through the session so the opponent stays in step
    /// with the world.
    pub fn apply(&mut self, command: Command, out_events: &mut Vec<Event>) {
        match command {
            Command::Tick { dt } => self.tick(dt, out_events),
            Command::ResetGame => self.reset_game(out_events),
            other => world::apply(&mut self.world, other, out_events),
        }
    }

    /// Faction that won, if the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<Faction> {
        query::winner(&self.world)
    }
}

fn new_opponent(config: &SessionConfig) -> Opponent {
    Opponent::new(OpponentConfig::new(config.difficulty, config.seed))
}
