#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Turf simulation.
//!
//! This crate defines the vocabulary that connects hosts, the authoritative
//! world, and the opponent system. Hosts and systems submit [`Command`] values
//! describing desired mutations, the world executes them through its `apply`
//! entry point and broadcasts [`Event`] values describing what changed.
//! Systems read immutable views ([`TerritoryView`], [`UnitView`]) and respond
//! exclusively with new command batches.

pub mod ledger;

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use ledger::ResourceLedger;

/// Allegiance tag attached to cells and units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Unclaimed territory. Never owns units.
    #[default]
    Neutral,
    /// The human-controlled side.
    Player,
    /// The automated opponent.
    Opponent,
}

/// Activity a unit performs once it reaches its target cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionMode {
    /// Extract resources for the unit's faction.
    #[default]
    Collect,
    /// Push capture progress on the target cell.
    Attack,
}

impl ActionMode {
    /// Returns the opposite mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Collect => Self::Attack,
            Self::Attack => Self::Collect,
        }
    }
}

/// Opponent difficulty tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Slow spawns and purely random orders.
    Easy,
    /// Moderate spawns with probabilistic attack/collect orders.
    #[default]
    Normal,
    /// Fast spawns and per-kind strategic orders.
    Hard,
}

/// Catalog of unit types that can be spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// Even split between attacking and collecting.
    Balanced,
    /// Doubled attack power at the cost of halved collection.
    Assault,
    /// Doubled collection power at the cost of halved attack.
    Forager,
}

impl UnitKind {
    /// Every kind in catalog order.
    pub const ALL: [UnitKind; 3] = [Self::Balanced, Self::Assault, Self::Forager];

    /// Capture strength applied while attacking.
    #[must_use]
    pub const fn attack_power(self) -> f64 {
        match self {
            Self::Balanced => 1.0,
            Self::Assault => 2.0,
            Self::Forager => 0.5,
        }
    }

    /// Extraction strength applied while collecting.
    #[must_use]
    pub const fn collect_power(self) -> f64 {
        match self {
            Self::Balanced => 1.0,
            Self::Assault => 0.5,
            Self::Forager => 2.0,
        }
    }

    /// Resources debited from the player's ledger per spawn.
    #[must_use]
    pub const fn spawn_cost(self) -> u32 {
        match self {
            Self::Balanced => 10,
            Self::Assault => 15,
            Self::Forager => 12,
        }
    }

    /// Human readable label for selectors and logs.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Balanced => "Balanced",
            Self::Assault => "Assault",
            Self::Forager => "Forager",
        }
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Doubles as the handle units hold to their target cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Phase of a unit's move/act loop, derived from its target and position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitActivity {
    /// No target assigned.
    Idle,
    /// Travelling toward the target cell.
    Moving,
    /// Stationed at the target cell and performing its mode's action.
    Acting,
}

/// Reasons a spawn request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnError {
    /// Neutral territory never fields units.
    NeutralFaction,
    /// The requested position is not a finite point.
    InvalidPosition,
    /// The requested position or cell lies outside the grid.
    OutOfBounds,
    /// The requested cell is not owned by the spawning faction.
    NotOwned,
    /// The player's ledger cannot cover the spawn cost.
    InsufficientResources,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Restores the grid, rosters and ledger to their starting state.
    ResetGame,
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a unit at an arbitrary world position.
    SpawnUnit {
        /// Type of unit to create.
        kind: UnitKind,
        /// World-space position the unit appears at.
        position: Vec2,
        /// Faction that will own the unit.
        faction: Faction,
        /// Presentation footprint of the unit in world units.
        size: Vec2,
    },
    /// Spawns a unit at the centre of a cell owned by the spawning faction.
    SpawnUnitAtCell {
        /// Type of unit to create.
        kind: UnitKind,
        /// Cell the unit appears on.
        cell: CellCoord,
        /// Faction that will own the unit.
        faction: Faction,
        /// Mode the unit starts in.
        mode: ActionMode,
    },
    /// Sends a unit toward a cell.
    SetUnitTarget {
        /// Unit receiving the order.
        unit: UnitId,
        /// Destination cell.
        cell: CellCoord,
    },
    /// Flips a unit between collecting and attacking.
    ToggleUnitMode {
        /// Unit receiving the order.
        unit: UnitId,
    },
    /// Forces a unit into the provided mode.
    SetUnitMode {
        /// Unit receiving the order.
        unit: UnitId,
        /// Mode to adopt.
        mode: ActionMode,
    },
    /// Overrides a unit's position for hosts that interpolate movement.
    SetUnitPosition {
        /// Unit being moved.
        unit: UnitId,
        /// New world-space position.
        position: Vec2,
    },
    /// Removes a unit from its roster.
    RemoveUnit {
        /// Unit to remove.
        unit: UnitId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the world returned to its starting state.
    GameReset,
    /// Confirms that a unit joined a roster.
    UnitSpawned {
        /// Identifier assigned to the new unit.
        unit: UnitId,
        /// Type of the new unit.
        kind: UnitKind,
        /// Faction that owns the new unit.
        faction: Faction,
        /// Mode the new unit starts in.
        mode: ActionMode,
    },
    /// Reports that a spawn request was rejected.
    SpawnRejected {
        /// Type of unit requested.
        kind: UnitKind,
        /// Faction that requested the spawn.
        faction: Faction,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Confirms that a unit received a new target cell.
    UnitRetargeted {
        /// Unit that was retargeted.
        unit: UnitId,
        /// New destination cell.
        cell: CellCoord,
    },
    /// Confirms that a unit switched modes.
    UnitModeChanged {
        /// Unit whose mode changed.
        unit: UnitId,
        /// Mode that became active.
        mode: ActionMode,
    },
    /// Confirms that a unit left its roster.
    UnitRemoved {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// Reports a completed collection action.
    ResourcesCollected {
        /// Unit that finished collecting.
        unit: UnitId,
        /// Faction whose ledger should be credited.
        faction: Faction,
        /// Whole resource units gathered.
        amount: u32,
    },
    /// Reports that a cell changed owner.
    CellCaptured {
        /// Cell that changed hands.
        cell: CellCoord,
        /// Owner before the capture.
        previous: Faction,
        /// Owner after the capture.
        owner: Faction,
    },
    /// Announces the terminal win/loss transition.
    GameOver {
        /// Faction that reached the territory threshold.
        winner: Faction,
    },
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Catalog entry of the unit.
    pub kind: UnitKind,
    /// Faction that owns the unit.
    pub faction: Faction,
    /// Current action mode.
    pub mode: ActionMode,
    /// World-space position.
    pub position: Vec2,
    /// Presentation footprint in world units.
    pub size: Vec2,
    /// Cell the unit is heading to or stationed at.
    pub target: Option<CellCoord>,
    /// Seconds accumulated toward the current action.
    pub action_progress: f64,
    /// Phase of the move/act loop.
    pub activity: UnitActivity,
}

/// Read-only snapshot describing every unit on the field.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Iterator over the units fielded by one faction.
    pub fn owned_by(&self, faction: Faction) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots
            .iter()
            .filter(move |snapshot| snapshot.faction == faction)
    }

    /// Looks up a unit by identifier.
    #[must_use]
    pub fn get(&self, unit: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&unit, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Reports whether no unit was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read-only snapshot of cell ownership laid out row-major.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerritoryView {
    columns: u32,
    rows: u32,
    owners: Vec<Faction>,
}

impl TerritoryView {
    /// Captures a new territory view from row-major owners.
    #[must_use]
    pub fn new(columns: u32, rows: u32, owners: Vec<Faction>) -> Self {
        debug_assert_eq!(
            owners.len() as u64,
            u64::from(columns) * u64::from(rows),
            "owner count must match grid dimensions"
        );
        Self {
            columns,
            rows,
            owners,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Reports whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Returns the owner of the provided cell, if it exists.
    #[must_use]
    pub fn owner(&self, cell: CellCoord) -> Option<Faction> {
        self.index(cell)
            .and_then(|index| self.owners.get(index).copied())
    }

    /// Iterates every cell with its owner in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Faction)> + '_ {
        let columns = self.columns.max(1);
        self.owners.iter().enumerate().map(move |(index, owner)| {
            let index = index as u32;
            (CellCoord::new(index % columns, index / columns), *owner)
        })
    }

    /// Iterates the cells held by one faction in row-major order.
    pub fn cells_owned_by(&self, faction: Faction) -> impl Iterator<Item = CellCoord> + '_ {
        self.iter()
            .filter(move |(_, owner)| *owner == faction)
            .map(|(cell, _)| cell)
    }

    /// Counts the cells held by one faction.
    #[must_use]
    pub fn count(&self, faction: Faction) -> usize {
        self.owners.iter().filter(|owner| **owner == faction).count()
    }

    /// Fraction of the grid held by one faction. Zero for an empty grid.
    #[must_use]
    pub fn share(&self, faction: Faction) -> f64 {
        if self.owners.is_empty() {
            return 0.0;
        }
        self.count(faction) as f64 / self.owners.len() as f64
    }

    /// Iterates the in-bounds orthogonal neighbours of a cell.
    pub fn orthogonal_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        let column = cell.column();
        let row = cell.row();
        [
            column.checked_add(1).map(|next| CellCoord::new(next, row)),
            column.checked_sub(1).map(|next| CellCoord::new(next, row)),
            row.checked_add(1).map(|next| CellCoord::new(column, next)),
            row.checked_sub(1).map(|next| CellCoord::new(column, next)),
        ]
        .into_iter()
        .flatten()
        .filter(move |neighbor| self.contains(*neighbor))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}
