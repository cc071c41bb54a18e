//! Mobile units and their move/act state machine.

use std::time::Duration;

use glam::Vec2;
use turf_core::{ActionMode, CellCoord, Faction, UnitActivity, UnitId, UnitKind, UnitSnapshot};

use crate::territory::TerritoryGrid;

/// Seconds a unit with unit collect power needs per collection.
pub const BASE_COLLECT_TIME: f64 = 2.0;
/// Seconds a unit with unit attack power needs per capture.
pub const BASE_ATTACK_TIME: f64 = 3.0;

/// Travel parameters shared by every unit in a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Distance at or below which a unit starts acting.
    pub arrival_threshold: f32,
    /// Straight-line travel speed in world units per second.
    pub move_speed: f32,
}

/// Externally visible result of a unit's action completing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitOutcome {
    /// A collection cycle finished.
    Collected {
        /// Whole resource units gathered.
        amount: u32,
    },
    /// The target cell changed owner to the unit's faction.
    Captured {
        /// Cell that changed hands.
        cell: CellCoord,
        /// Owner before the capture.
        previous: Faction,
    },
}

/// A single unit fielded by a faction.
#[derive(Clone, Debug)]
pub struct Unit {
    id: UnitId,
    kind: UnitKind,
    faction: Faction,
    mode: ActionMode,
    position: Vec2,
    size: Vec2,
    target: Option<CellCoord>,
    action_progress: f64,
}

impl Unit {
    /// Creates an idle collecting unit.
    #[must_use]
    pub fn new(id: UnitId, kind: UnitKind, faction: Faction, position: Vec2, size: Vec2) -> Self {
        Self {
            id,
            kind,
            faction,
            mode: ActionMode::Collect,
            position,
            size,
            target: None,
            action_progress: 0.0,
        }
    }

    /// Identifier allocated by the world.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Catalog entry of the unit.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Faction that fields the unit.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Current action mode.
    #[must_use]
    pub const fn mode(&self) -> ActionMode {
        self.mode
    }

    /// World-space position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Cell the unit is heading to or stationed at.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Seconds accumulated toward the current action.
    #[must_use]
    pub const fn action_progress(&self) -> f64 {
        self.action_progress
    }

    /// Sends the unit toward `cell` and restarts its action.
    pub fn set_target(&mut self, cell: CellCoord) {
        self.target = Some(cell);
        self.action_progress = 0.0;
    }

    /// Flips between collecting and attacking, keeping in-flight progress.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Adopts `mode`, keeping in-flight progress. Returns whether it changed.
    pub fn set_mode(&mut self, mode: ActionMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    /// Overrides the position for hosts that interpolate movement themselves.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Seconds one action takes in the current mode.
    ///
    /// `None` when the relevant power is not positive.
    #[must_use]
    pub fn action_duration(&self) -> Option<f64> {
        let (base, power) = match self.mode {
            ActionMode::Collect => (BASE_COLLECT_TIME, self.kind.collect_power()),
            ActionMode::Attack => (BASE_ATTACK_TIME, self.kind.attack_power()),
        };
        (power > 0.0).then(|| base / power)
    }

    /// Derives the phase of the move/act loop.
    #[must_use]
    pub fn activity(&self, grid: &TerritoryGrid, arrival_threshold: f32) -> UnitActivity {
        let Some(destination) = self.target.and_then(|cell| grid.center_of(cell)) else {
            return UnitActivity::Idle;
        };
        if self.position.distance(destination) > arrival_threshold {
            UnitActivity::Moving
        } else {
            UnitActivity::Acting
        }
    }

    /// Advances the unit by `dt`.
    ///
    /// Units outside the arrival threshold travel toward their target and do
    /// not act during that tick. Stationed units accumulate action progress:
    /// collectors report a gathered amount each full cycle, attackers feed
    /// capture progress into the target cell every tick.
    pub fn tick(
        &mut self,
        dt: Duration,
        grid: &mut TerritoryGrid,
        motion: Motion,
    ) -> Option<UnitOutcome> {
        let cell = self.target?;
        let destination = grid.center_of(cell)?;

        let distance = self.position.distance(destination);
        if distance > motion.arrival_threshold {
            self.advance_toward(destination, distance, motion.move_speed * dt.as_secs_f32());
            return None;
        }

        let dt = dt.as_secs_f64();
        self.action_progress += dt;
        let duration = self.action_duration()?;

        match self.mode {
            ActionMode::Collect => {
                if self.action_progress / duration < 1.0 {
                    return None;
                }
                self.action_progress = 0.0;
                Some(UnitOutcome::Collected {
                    amount: self.kind.collect_power() as u32,
                })
            }
            ActionMode::Attack => {
                if self.faction == Faction::Neutral {
                    return None;
                }
                let amount = (dt / duration) * self.kind.attack_power();
                let target = grid.cell_mut(cell)?;
                let previous = target.owner();
                if !target.progress_capture(amount, self.faction) {
                    return None;
                }
                self.action_progress = 0.0;
                Some(UnitOutcome::Captured { cell, previous })
            }
        }
    }

    /// Captures an immutable snapshot for hosts and systems.
    #[must_use]
    pub fn snapshot(&self, grid: &TerritoryGrid, arrival_threshold: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            kind: self.kind,
            faction: self.faction,
            mode: self.mode,
            position: self.position,
            size: self.size,
            target: self.target,
            action_progress: self.action_progress,
            activity: self.activity(grid, arrival_threshold),
        }
    }

    fn advance_toward(&mut self, destination: Vec2, distance: f32, step: f32) {
        if step >= distance {
            self.position = destination;
        } else if step > 0.0 {
            self.position += (destination - self.position) * (step / distance);
        }
    }
}
