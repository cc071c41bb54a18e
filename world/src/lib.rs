#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Turf.
//!
//! The [`World`] owns the territory grid, both unit rosters, and the player's
//! resource ledger. Hosts mutate it through [`apply`] or the equivalent
//! methods and read it through [`query`]. Every mutation reports what changed
//! as [`Event`] values pushed into a caller-provided buffer.

mod config;
pub mod territory;
pub mod unit;

use std::time::Duration;

use glam::Vec2;
use turf_core::{
    ActionMode, CellCoord, Command, Event, Faction, ResourceLedger, SpawnError, UnitId, UnitKind,
};

pub use config::{
    ConfigError, WorldConfig, DEFAULT_ARRIVAL_THRESHOLD, DEFAULT_COLUMNS, DEFAULT_HOME_ROWS,
    DEFAULT_MOVE_SPEED, DEFAULT_ROWS, DEFAULT_TILE_LENGTH, PLAYER_BASE_ACCRUAL,
    PLAYER_BONUS_PER_CELL, STARTING_RESOURCES,
};

use territory::TerritoryGrid;
use unit::{Motion, Unit, UnitOutcome};

/// Share of the grid a faction must hold to win.
pub const WIN_SHARE: f64 = 0.7;

/// Footprint given to units spawned on a cell.
pub const DEFAULT_UNIT_SIZE: Vec2 = Vec2::new(30.0, 30.0);

/// Represents the authoritative Turf world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: TerritoryGrid,
    ledger: ResourceLedger,
    player_units: Vec<Unit>,
    opponent_units: Vec<Unit>,
    next_unit_id: u32,
    winner: Option<Faction>,
    tick_index: u64,
}

impl World {
    /// Creates a world using the default 8x12 configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(WorldConfig::default())
    }

    /// Creates a world after validating the provided configuration.
    pub fn with_config(config: WorldConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: WorldConfig) -> Self {
        Self {
            grid: seeded_grid(&config),
            ledger: player_ledger(&config),
            player_units: Vec::new(),
            opponent_units: Vec::new(),
            next_unit_id: 0,
            winner: None,
            tick_index: 0,
            config,
        }
    }

    /// Restores the seeded grid, empty rosters, and starting balance.
    pub fn reset_game(&mut self, out_events: &mut Vec<Event>) {
        self.grid = seeded_grid(&self.config);
        self.ledger = player_ledger(&self.config);
        self.player_units.clear();
        self.opponent_units.clear();
        self.next_unit_id = 0;
        self.winner = None;
        self.tick_index = 0;
        log::info!(
            "game reset on a {}x{} grid",
            self.config.columns,
            self.config.rows
        );
        out_events.push(Event::GameReset);
    }

    /// Runs a full tick without any opponent system in the loop.
    pub fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.begin_tick(dt, out_events);
        self.finish_tick(dt, out_events);
    }

    /// First tick phase: accrue the player's ledger and evaluate the win
    /// conditions against the ownership left by the previous tick.
    pub fn begin_tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });
        let _ = self.ledger.accrue(dt);
        self.evaluate_outcome(out_events);
    }

    /// Last tick phase: advance every unit, player roster first, then derive
    /// the player's accrual rate from the resulting territory.
    pub fn finish_tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let motion = Motion {
            arrival_threshold: self.config.arrival_threshold,
            move_speed: self.config.move_speed,
        };

        for unit in self
            .player_units
            .iter_mut()
            .chain(self.opponent_units.iter_mut())
        {
            match unit.tick(dt, &mut self.grid, motion) {
                Some(UnitOutcome::Collected { amount }) => {
                    if amount == 0 {
                        continue;
                    }
                    if unit.faction() == Faction::Player {
                        self.ledger.credit(amount);
                    }
                    out_events.push(Event::ResourcesCollected {
                        unit: unit.id(),
                        faction: unit.faction(),
                        amount,
                    });
                }
                Some(UnitOutcome::Captured { cell, previous }) => {
                    log::info!(
                        "cell ({}, {}) captured by {:?} from {:?}",
                        cell.column(),
                        cell.row(),
                        unit.faction(),
                        previous
                    );
                    out_events.push(Event::CellCaptured {
                        cell,
                        previous,
                        owner: unit.faction(),
                    });
                }
                None => {}
            }
        }

        self.ledger
            .recompute_accrual_rate(self.grid.count_owned_by(Faction::Player));
    }

    /// Spawns a unit at an arbitrary world position.
    ///
    /// Player spawns are paid from the player's ledger; opponent spawns are
    /// paid upstream by the opponent system. Rejections leave the world
    /// untouched apart from the emitted [`Event::SpawnRejected`].
    pub fn spawn_unit(
        &mut self,
        kind: UnitKind,
        position: Vec2,
        faction: Faction,
        size: Vec2,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        self.insert_unit(kind, position, faction, size, ActionMode::Collect, out_events)
    }

    /// Spawns a unit at the centre of a cell the faction owns.
    pub fn spawn_unit_at_cell(
        &mut self,
        kind: UnitKind,
        cell: CellCoord,
        faction: Faction,
        mode: ActionMode,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        if faction == Faction::Neutral {
            return reject(kind, faction, SpawnError::NeutralFaction, out_events);
        }
        let Some(target) = self.grid.cell(cell) else {
            return reject(kind, faction, SpawnError::OutOfBounds, out_events);
        };
        if target.owner() != faction {
            return reject(kind, faction, SpawnError::NotOwned, out_events);
        }
        let Some(position) = self.grid.center_of(cell) else {
            return reject(kind, faction, SpawnError::OutOfBounds, out_events);
        };
        self.insert_unit(kind, position, faction, DEFAULT_UNIT_SIZE, mode, out_events)
    }

    /// Sends a unit toward a cell. Unknown units or cells are ignored.
    pub fn set_unit_target(
        &mut self,
        unit: UnitId,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> bool {
        if !self.grid.contains(cell) {
            log::debug!("ignoring target outside the grid for unit {}", unit.get());
            return false;
        }
        let Some(entry) = self.unit_mut(unit) else {
            return false;
        };
        entry.set_target(cell);
        out_events.push(Event::UnitRetargeted { unit, cell });
        true
    }

    /// Flips a unit between collecting and attacking.
    pub fn toggle_unit_mode(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        let Some(entry) = self.unit_mut(unit) else {
            return false;
        };
        entry.toggle_mode();
        out_events.push(Event::UnitModeChanged {
            unit,
            mode: entry.mode(),
        });
        true
    }

    /// Forces a unit into `mode`. Only an actual change is reported.
    pub fn set_unit_mode(
        &mut self,
        unit: UnitId,
        mode: ActionMode,
        out_events: &mut Vec<Event>,
    ) -> bool {
        let Some(entry) = self.unit_mut(unit) else {
            return false;
        };
        if entry.set_mode(mode) {
            out_events.push(Event::UnitModeChanged { unit, mode });
        }
        true
    }

    /// Overrides a unit's position. Non-finite positions are ignored.
    pub fn set_unit_position(&mut self, unit: UnitId, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        let Some(entry) = self.unit_mut(unit) else {
            return false;
        };
        entry.set_position(position);
        true
    }

    /// Removes a unit from whichever roster holds it.
    pub fn remove_unit(&mut self, unit: UnitId, out_events: &mut Vec<Event>) -> bool {
        for roster in [&mut self.player_units, &mut self.opponent_units] {
            if let Some(index) = roster.iter().position(|entry| entry.id() == unit) {
                let _ = roster.remove(index);
                out_events.push(Event::UnitRemoved { unit });
                return true;
            }
        }
        false
    }

    /// Reports whether the player holds at least [`WIN_SHARE`] of the grid.
    #[must_use]
    pub fn check_player_win_condition(&self) -> bool {
        self.holds_winning_share(Faction::Player)
    }

    /// Reports whether the opponent holds at least [`WIN_SHARE`] of the grid.
    #[must_use]
    pub fn check_opponent_win_condition(&self) -> bool {
        self.holds_winning_share(Faction::Opponent)
    }

    /// Reports whether a winner has been decided.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Reports whether the decided winner is the player.
    #[must_use]
    pub fn is_player_win(&self) -> bool {
        self.winner == Some(Faction::Player)
    }

    fn holds_winning_share(&self, faction: Faction) -> bool {
        let total = self.grid.len();
        if total == 0 {
            return false;
        }
        self.grid.count_owned_by(faction) as f64 / total as f64 >= WIN_SHARE
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.winner.is_some() {
            return;
        }
        let winner = if self.check_player_win_condition() {
            Faction::Player
        } else if self.check_opponent_win_condition() {
            Faction::Opponent
        } else {
            return;
        };
        self.winner = Some(winner);
        log::info!("game over after {} ticks, winner {:?}", self.tick_index, winner);
        out_events.push(Event::GameOver { winner });
    }

    fn insert_unit(
        &mut self,
        kind: UnitKind,
        position: Vec2,
        faction: Faction,
        size: Vec2,
        mode: ActionMode,
        out_events: &mut Vec<Event>,
    ) -> Option<UnitId> {
        if faction == Faction::Neutral {
            return reject(kind, faction, SpawnError::NeutralFaction, out_events);
        }
        if !position.is_finite() {
            return reject(kind, faction, SpawnError::InvalidPosition, out_events);
        }
        if !self.grid.contains_position(position) {
            return reject(kind, faction, SpawnError::OutOfBounds, out_events);
        }
        if faction == Faction::Player && !self.ledger.try_debit(kind.spawn_cost()) {
            return reject(kind, faction, SpawnError::InsufficientResources, out_events);
        }

        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.saturating_add(1);
        let mut unit = Unit::new(id, kind, faction, position, size);
        let _ = unit.set_mode(mode);
        if faction == Faction::Player {
            self.player_units.push(unit);
        } else {
            self.opponent_units.push(unit);
        }

        log::debug!(
            "{:?} spawned {} unit {}",
            faction,
            kind.display_name(),
            id.get()
        );
        out_events.push(Event::UnitSpawned {
            unit: id,
            kind,
            faction,
            mode,
        });
        Some(id)
    }

    fn units(&self) -> impl Iterator<Item = &Unit> {
        self.player_units.iter().chain(self.opponent_units.iter())
    }

    fn unit_mut(&mut self, unit: UnitId) -> Option<&mut Unit> {
        self.player_units
            .iter_mut()
            .chain(self.opponent_units.iter_mut())
            .find(|entry| entry.id() == unit)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ResetGame => world.reset_game(out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnUnit {
            kind,
            position,
            faction,
            size,
        } => {
            let _ = world.spawn_unit(kind, position, faction, size, out_events);
        }
        Command::SpawnUnitAtCell {
            kind,
            cell,
            faction,
            mode,
        } => {
            let _ = world.spawn_unit_at_cell(kind, cell, faction, mode, out_events);
        }
        Command::SetUnitTarget { unit, cell } => {
            let _ = world.set_unit_target(unit, cell, out_events);
        }
        Command::ToggleUnitMode { unit } => {
            let _ = world.toggle_unit_mode(unit, out_events);
        }
        Command::SetUnitMode { unit, mode } => {
            let _ = world.set_unit_mode(unit, mode, out_events);
        }
        Command::SetUnitPosition { unit, position } => {
            let _ = world.set_unit_position(unit, position);
        }
        Command::RemoveUnit { unit } => {
            let _ = world.remove_unit(unit, out_events);
        }
    }
}

fn reject(
    kind: UnitKind,
    faction: Faction,
    reason: SpawnError,
    out_events: &mut Vec<Event>,
) -> Option<UnitId> {
    log::debug!(
        "rejected {:?} {} spawn: {:?}",
        faction,
        kind.display_name(),
        reason
    );
    out_events.push(Event::SpawnRejected {
        kind,
        faction,
        reason,
    });
    None
}

fn seeded_grid(config: &WorldConfig) -> TerritoryGrid {
    TerritoryGrid::seeded(
        config.columns,
        config.rows,
        config.tile_length,
        config.home_rows,
    )
}

fn player_ledger(config: &WorldConfig) -> ResourceLedger {
    ResourceLedger::new(
        config.starting_resources,
        PLAYER_BASE_ACCRUAL,
        PLAYER_BONUS_PER_CELL,
    )
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec2;
    use turf_core::{
        CellCoord, Faction, ResourceLedger, TerritoryView, UnitId, UnitSnapshot, UnitView,
    };

    use super::{territory::TerritoryCell, territory::TerritoryGrid, World, WorldConfig};

    /// Provides the configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Provides read-only access to the territory grid.
    #[must_use]
    pub fn grid(world: &World) -> &TerritoryGrid {
        &world.grid
    }

    /// Captures the ownership of every cell.
    #[must_use]
    pub fn territory_view(world: &World) -> TerritoryView {
        world.grid.view()
    }

    /// Looks up a single cell.
    #[must_use]
    pub fn cell(world: &World, coord: CellCoord) -> Option<&TerritoryCell> {
        world.grid.cell(coord)
    }

    /// Resolves the cell under a world-space point, such as a tap.
    #[must_use]
    pub fn cell_at_position(world: &World, position: Vec2) -> Option<CellCoord> {
        world.grid.cell_at(position)
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(world: &World, coord: CellCoord) -> Option<Vec2> {
        world.grid.center_of(coord)
    }

    /// Number of cells held by one faction.
    #[must_use]
    pub fn owned_cell_count(world: &World, faction: Faction) -> usize {
        world.grid.count_owned_by(faction)
    }

    /// Captures a read-only view of both rosters.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        let threshold = world.config.arrival_threshold;
        UnitView::from_snapshots(
            world
                .units()
                .map(|unit| unit.snapshot(&world.grid, threshold))
                .collect(),
        )
    }

    /// Captures a single unit.
    #[must_use]
    pub fn unit(world: &World, unit: UnitId) -> Option<UnitSnapshot> {
        world
            .units()
            .find(|entry| entry.id() == unit)
            .map(|entry| entry.snapshot(&world.grid, world.config.arrival_threshold))
    }

    /// Provides the player's ledger.
    #[must_use]
    pub fn ledger(world: &World) -> &ResourceLedger {
        &world.ledger
    }

    /// Player's current balance.
    #[must_use]
    pub fn resources(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Player's current accrual rate per second.
    #[must_use]
    pub fn accrual_rate(world: &World) -> f64 {
        world.ledger.accrual_rate()
    }

    /// Faction that won, if the game is over.
    #[must_use]
    pub fn winner(world: &World) -> Option<Faction> {
        world.winner
    }

    /// Reports whether a winner has been decided.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.is_game_over()
    }

    /// Reports whether the player won.
    #[must_use]
    pub fn is_player_win(world: &World) -> bool {
        world.is_player_win()
    }

    /// Number of ticks processed since the last reset.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
