//! Cell ownership state and the grid arena that stores it.

use glam::Vec2;
use turf_core::{CellCoord, Faction, TerritoryView};

/// Slack allowed when deciding that accumulated progress reached `1.0`.
///
/// Contributions arrive as many small `dt` fractions whose floating-point sum
/// can fall a few ulps short of the exact total.
pub const CAPTURE_TOLERANCE: f64 = 1e-9;

/// Single grid cell with its owner and pending capture progress.
#[derive(Clone, Debug, PartialEq)]
pub struct TerritoryCell {
    coord: CellCoord,
    owner: Faction,
    capture_progress: f64,
}

impl TerritoryCell {
    /// Creates an unclaimed cell at the provided coordinate.
    #[must_use]
    pub const fn new(coord: CellCoord) -> Self {
        Self {
            coord,
            owner: Faction::Neutral,
            capture_progress: 0.0,
        }
    }

    /// Position of the cell inside the grid.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Faction currently holding the cell.
    #[must_use]
    pub const fn owner(&self) -> Faction {
        self.owner
    }

    /// Progress toward the next ownership change, within `[0, 1]`.
    #[must_use]
    pub const fn capture_progress(&self) -> f64 {
        self.capture_progress
    }

    /// Pushes `candidate`'s claim on the cell by `amount`.
    ///
    /// The owner reinforcing its own cell saturates progress at `1.0` without
    /// changing hands. Any other candidate adds to the single shared progress
    /// scalar; reaching `1.0` (within [`CAPTURE_TOLERANCE`]) transfers
    /// ownership, resets progress to zero and returns `true`. Negative or
    /// non-finite amounts add nothing.
    pub fn progress_capture(&mut self, amount: f64, candidate: Faction) -> bool {
        if candidate == self.owner {
            self.capture_progress = 1.0;
            return false;
        }

        if amount.is_finite() && amount > 0.0 {
            self.capture_progress += amount;
        }

        if self.capture_progress >= 1.0 - CAPTURE_TOLERANCE {
            self.capture_progress = 0.0;
            self.owner = candidate;
            return true;
        }

        false
    }
}

/// Row-major arena of cells addressed by [`CellCoord`] handles.
#[derive(Clone, Debug)]
pub struct TerritoryGrid {
    columns: u32,
    rows: u32,
    tile_length: f32,
    cells: Vec<TerritoryCell>,
}

impl TerritoryGrid {
    /// Creates a grid where every cell is neutral.
    #[must_use]
    pub fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        let mut cells = Vec::with_capacity(capacity(columns, rows));
        for row in 0..rows {
            for column in 0..columns {
                cells.push(TerritoryCell::new(CellCoord::new(column, row)));
            }
        }
        Self {
            columns,
            rows,
            tile_length,
            cells,
        }
    }

    /// Creates a grid whose bottom `home_rows` belong to the player and whose
    /// top `home_rows` belong to the opponent.
    #[must_use]
    pub fn seeded(columns: u32, rows: u32, tile_length: f32, home_rows: u32) -> Self {
        let mut grid = Self::new(columns, rows, tile_length);
        let opponent_start = rows.saturating_sub(home_rows);
        for cell in &mut grid.cells {
            let row = cell.coord.row();
            if row < home_rows {
                let _ = cell.progress_capture(1.0, Faction::Player);
            } else if row >= opponent_start {
                let _ = cell.progress_capture(1.0, Faction::Opponent);
            }
        }
        grid
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the grid has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the coordinate addresses a cell.
    #[must_use]
    pub const fn contains(&self, coord: CellCoord) -> bool {
        coord.column() < self.columns && coord.row() < self.rows
    }

    /// Looks up a cell.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&TerritoryCell> {
        self.index(coord).and_then(|index| self.cells.get(index))
    }

    /// Looks up a cell for mutation.
    pub fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut TerritoryCell> {
        self.index(coord).and_then(|index| self.cells.get_mut(index))
    }

    /// Iterates every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &TerritoryCell> {
        self.cells.iter()
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn center_of(&self, coord: CellCoord) -> Option<Vec2> {
        if !self.contains(coord) {
            return None;
        }
        Some(Vec2::new(
            (coord.column() as f32 + 0.5) * self.tile_length,
            (coord.row() as f32 + 0.5) * self.tile_length,
        ))
    }

    /// Reports whether a world-space point lies on the grid.
    #[must_use]
    pub fn contains_position(&self, position: Vec2) -> bool {
        self.cell_at(position).is_some()
    }

    /// Resolves the cell that contains a world-space point.
    #[must_use]
    pub fn cell_at(&self, position: Vec2) -> Option<CellCoord> {
        if !position.is_finite() || position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let column = (position.x / self.tile_length).floor();
        let row = (position.y / self.tile_length).floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }
        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Counts the cells held by one faction.
    #[must_use]
    pub fn count_owned_by(&self, faction: Faction) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.owner == faction)
            .count()
    }

    /// Captures an ownership snapshot for systems.
    #[must_use]
    pub fn view(&self) -> TerritoryView {
        TerritoryView::new(
            self.columns,
            self.rows,
            self.cells.iter().map(TerritoryCell::owner).collect(),
        )
    }

    fn index(&self, coord: CellCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        let row = usize::try_from(coord.row()).ok()?;
        let column = usize::try_from(coord.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

fn capacity(columns: u32, rows: u32) -> usize {
    let capacity_u64 = u64::from(columns) * u64::from(rows);
    usize::try_from(capacity_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_reinforcing_saturates_without_change() {
        let mut cell = TerritoryCell::new(CellCoord::new(0, 0));
        assert!(!cell.progress_capture(0.25, Faction::Neutral));
        assert_eq!(cell.owner(), Faction::Neutral);
        assert_eq!(cell.capture_progress(), 1.0);
    }

    #[test]
    fn capture_completes_and_resets_progress() {
        let mut cell = TerritoryCell::new(CellCoord::new(1, 1));
        assert!(!cell.progress_capture(0.5, Faction::Player));
        assert_eq!(cell.capture_progress(), 0.5);
        assert!(cell.progress_capture(0.5, Faction::Player));
        assert_eq!(cell.owner(), Faction::Player);
        assert_eq!(cell.capture_progress(), 0.0);
    }

    #[test]
    fn many_small_contributions_complete_capture() {
        let mut cell = TerritoryCell::new(CellCoord::new(0, 0));
        // Ten tenths sum to 0.9999999999999999 in f64.
        for _ in 0..9 {
            assert!(!cell.progress_capture(0.1, Faction::Opponent));
        }
        assert!(cell.progress_capture(0.1, Faction::Opponent));
        assert_eq!(cell.owner(), Faction::Opponent);
        assert_eq!(cell.capture_progress(), 0.0);
    }

    #[test]
    fn contested_progress_is_shared_between_challengers() {
        let mut cell = TerritoryCell::new(CellCoord::new(2, 2));
        assert!(!cell.progress_capture(0.75, Faction::Player));
        assert!(cell.progress_capture(0.25, Faction::Opponent));
        assert_eq!(cell.owner(), Faction::Opponent);
    }

    #[test]
    fn invalid_amounts_add_nothing() {
        let mut cell = TerritoryCell::new(CellCoord::new(0, 0));
        assert!(!cell.progress_capture(f64::NAN, Faction::Player));
        assert!(!cell.progress_capture(-3.0, Faction::Player));
        assert_eq!(cell.capture_progress(), 0.0);
        assert_eq!(cell.owner(), Faction::Neutral);
    }

    #[test]
    fn seeded_grid_assigns_home_rows() {
        let grid = TerritoryGrid::seeded(8, 12, 50.0, 2);
        assert_eq!(grid.len(), 96);
        assert_eq!(grid.count_owned_by(Faction::Player), 16);
        assert_eq!(grid.count_owned_by(Faction::Opponent), 16);
        assert_eq!(grid.count_owned_by(Faction::Neutral), 64);
        let corner = grid.cell(CellCoord::new(7, 11)).expect("corner cell");
        assert_eq!(corner.owner(), Faction::Opponent);
        assert_eq!(corner.capture_progress(), 0.0);
    }

    #[test]
    fn positions_map_to_cells_and_back() {
        let grid = TerritoryGrid::new(4, 3, 50.0);
        let coord = CellCoord::new(2, 1);
        let center = grid.center_of(coord).expect("center");
        assert_eq!(center, Vec2::new(125.0, 75.0));
        assert_eq!(grid.cell_at(center), Some(coord));
        assert_eq!(grid.cell_at(Vec2::new(200.0, 10.0)), None);
        assert_eq!(grid.cell_at(Vec2::new(-0.5, 10.0)), None);
        assert_eq!(grid.cell_at(Vec2::new(f32::NAN, 10.0)), None);
    }

    #[test]
    fn out_of_bounds_lookups_return_none() {
        let mut grid = TerritoryGrid::new(2, 2, 10.0);
        assert!(grid.cell(CellCoord::new(2, 0)).is_none());
        assert!(grid.cell_mut(CellCoord::new(0, 2)).is_none());
        assert!(grid.center_of(CellCoord::new(5, 5)).is_none());
    }
}
