//! Construction-time parameters of the world.

use thiserror::Error;

/// Default number of grid columns.
pub const DEFAULT_COLUMNS: u32 = 8;
/// Default number of grid rows.
pub const DEFAULT_ROWS: u32 = 12;
/// Default side length of a cell in world units.
pub const DEFAULT_TILE_LENGTH: f32 = 50.0;
/// Default number of rows seeded for each faction at either edge.
pub const DEFAULT_HOME_ROWS: u32 = 2;
/// Default distance at or below which a unit counts as arrived.
pub const DEFAULT_ARRIVAL_THRESHOLD: f32 = 5.0;
/// Default unit travel speed in world units per second.
pub const DEFAULT_MOVE_SPEED: f32 = 100.0;
/// Balance both factions start out with.
pub const STARTING_RESOURCES: u32 = 30;
/// Player accrual per second before territory bonuses.
pub const PLAYER_BASE_ACCRUAL: f64 = 1.0;
/// Additional player accrual per second for every owned cell.
pub const PLAYER_BONUS_PER_CELL: f64 = 0.2;

/// Parameters fixed for the lifetime of a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Number of cell columns.
    pub columns: u32,
    /// Number of cell rows.
    pub rows: u32,
    /// Side length of a square cell in world units.
    pub tile_length: f32,
    /// Rows pre-assigned to the player at the bottom and the opponent at the top.
    pub home_rows: u32,
    /// Distance at or below which a unit starts acting on its target.
    pub arrival_threshold: f32,
    /// Straight-line travel speed in world units per second.
    pub move_speed: f32,
    /// Player balance after every reset.
    pub starting_resources: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            tile_length: DEFAULT_TILE_LENGTH,
            home_rows: DEFAULT_HOME_ROWS,
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            move_speed: DEFAULT_MOVE_SPEED,
            starting_resources: STARTING_RESOURCES,
        }
    }
}

impl WorldConfig {
    /// Default configuration resized to the provided grid.
    #[must_use]
    pub fn with_grid(columns: u32, rows: u32) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// Checks that the configuration describes a playable world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns == 0 || self.rows == 0 {
            return Err(ConfigError::EmptyGrid {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if u64::from(self.home_rows) * 2 > u64::from(self.rows) {
            return Err(ConfigError::OverlappingHomeRows {
                home_rows: self.home_rows,
                rows: self.rows,
            });
        }
        if !is_positive(self.tile_length) {
            return Err(ConfigError::InvalidTileLength(self.tile_length));
        }
        if !(self.arrival_threshold.is_finite() && self.arrival_threshold >= 0.0) {
            return Err(ConfigError::InvalidArrivalThreshold(self.arrival_threshold));
        }
        if !is_positive(self.move_speed) {
            return Err(ConfigError::InvalidMoveSpeed(self.move_speed));
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Reasons a [`WorldConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid must contain at least one cell (got {columns}x{rows})")]
    EmptyGrid {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Player and opponent home rows would overlap.
    #[error("{home_rows} home rows per faction do not fit in {rows} rows")]
    OverlappingHomeRows {
        /// Requested home rows per faction.
        home_rows: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Tile length is not a positive finite number.
    #[error("tile length must be positive and finite (got {0})")]
    InvalidTileLength(f32),
    /// Arrival threshold is negative or not finite.
    #[error("arrival threshold must be non-negative and finite (got {0})")]
    InvalidArrivalThreshold(f32),
    /// Move speed is not a positive finite number.
    #[error("move speed must be positive and finite (got {0})")]
    InvalidMoveSpeed(f32),
}
