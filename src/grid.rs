use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::Direction;

/// Layout character for a blocked tile
pub const BLOCKED_CHAR: char = '■';
/// Layout character for a free tile
pub const FREE_CHAR: char = '□';

/// A cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Cell { col, row }
    }

    /// Number of unit steps between two cells on a 4-connected grid
    pub fn manhattan(&self, other: &Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }

    /// Euclidean distance in cell units
    pub fn distance(&self, other: &Cell) -> f32 {
        let dc = (self.col - other.col) as f32;
        let dr = (self.row - other.row) as f32;
        (dc * dc + dr * dr).sqrt()
    }

    /// Adjacent cell in the given direction. Not bounds-checked.
    pub fn step(&self, direction: Direction) -> Cell {
        let (dc, dr) = direction.delta();
        Cell::new(self.col + dc, self.row + dr)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.col, self.row)
    }
}

/// Occupancy of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Free,
    Blocked,
}

/// Rectangular occupancy grid, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
    tiles: Vec<Tile>,
}

/// Neighbor offsets in search order: left, right, up, down.
/// Tie-breaking in the path search depends on this order staying fixed.
const NEIGHBOR_ORDER: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

impl Grid {
    /// Create a new grid with all cells free
    pub fn new(rows: i32, cols: i32) -> Self {
        Self::uniform(rows, cols, Tile::Free)
    }

    /// Create a new grid with all cells blocked
    pub fn filled(rows: i32, cols: i32) -> Self {
        Self::uniform(rows, cols, Tile::Blocked)
    }

    fn uniform(rows: i32, cols: i32, tile: Tile) -> Self {
        let len = (rows.max(0) * cols.max(0)) as usize;
        Grid {
            rows,
            cols,
            tiles: vec![tile; len],
        }
    }

    /// Create a free grid with specific blocked cells. Out-of-bounds cells are ignored.
    pub fn with_blocked(rows: i32, cols: i32, blocked: &[Cell]) -> Self {
        let mut grid = Self::new(rows, cols);
        for &cell in blocked {
            grid.set_tile(cell, Tile::Blocked);
        }
        grid
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.col >= 0 && cell.col < self.cols && cell.row >= 0 && cell.row < self.rows
    }

    fn index(&self, cell: Cell) -> usize {
        (cell.col + cell.row * self.cols) as usize
    }

    /// Tile at the cell, or `None` when out of bounds
    pub fn tile(&self, cell: Cell) -> Option<Tile> {
        if self.in_bounds(cell) {
            Some(self.tiles[self.index(cell)])
        } else {
            None
        }
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.tile(cell) == Some(Tile::Free)
    }

    /// Out of bounds is considered blocked
    pub fn is_blocked(&self, cell: Cell) -> bool {
        !self.is_free(cell)
    }

    pub(crate) fn set_tile(&mut self, cell: Cell, tile: Tile) {
        if self.in_bounds(cell) {
            let idx = self.index(cell);
            self.tiles[idx] = tile;
        }
    }

    /// In-bounds free cells adjacent to `cell`, in left, right, up, down order
    pub fn neighbors4(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        NEIGHBOR_ORDER
            .into_iter()
            .map(move |dir| cell.step(dir))
            .filter(move |&next| self.is_free(next))
    }

    /// All free cells in row-major order
    pub fn free_cells(&self) -> Vec<Cell> {
        self.cells().filter(|&cell| self.is_free(cell)).collect()
    }

    pub fn blocked_count(&self) -> usize {
        self.tiles.iter().filter(|&&t| t == Tile::Blocked).count()
    }

    /// Every in-bounds cell in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(col, row)))
    }

    /// Render the grid as text, one line per row
    pub fn to_layout(&self) -> String {
        let mut result = String::new();
        for row in self.layout_rows() {
            result.push_str(&row);
            result.push('\n');
        }
        result
    }

    pub fn layout_rows(&self) -> Vec<String> {
        (0..self.rows)
            .map(|row| {
                (0..self.cols)
                    .map(|col| {
                        if self.is_blocked(Cell::new(col, row)) {
                            BLOCKED_CHAR
                        } else {
                            FREE_CHAR
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Parse a text layout. `■` and `#` are blocked; any other character is free.
    /// Blank lines are skipped; all rows must have the same width.
    pub fn from_layout(layout: &str) -> Result<Self, String> {
        let lines: Vec<&str> = layout
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return Err("No non-empty lines found in layout".to_string());
        }

        let cols = lines[0].chars().count() as i32;
        let rows = lines.len() as i32;
        let mut grid = Self::new(rows, cols);

        for (row, line) in lines.iter().enumerate() {
            let width = line.chars().count() as i32;
            if width != cols {
                return Err(format!(
                    "Row {} has width {}, expected {}",
                    row, width, cols
                ));
            }
            for (col, ch) in line.chars().enumerate() {
                if ch == BLOCKED_CHAR || ch == '#' {
                    grid.set_tile(Cell::new(col as i32, row as i32), Tile::Blocked);
                }
            }
        }

        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_is_blocked() {
        let grid = Grid::new(3, 4);
        assert!(grid.is_free(Cell::new(3, 2)));
        assert!(grid.is_blocked(Cell::new(4, 2)));
        assert!(grid.is_blocked(Cell::new(0, 3)));
        assert!(grid.is_blocked(Cell::new(-1, 0)));
        assert_eq!(grid.tile(Cell::new(0, -1)), None);
    }

    #[test]
    fn test_neighbor_order_is_left_right_up_down() {
        let grid = Grid::new(5, 5);
        let neighbors: Vec<Cell> = grid.neighbors4(Cell::new(2, 2)).collect();
        assert_eq!(
            neighbors,
            vec![
                Cell::new(1, 2),
                Cell::new(3, 2),
                Cell::new(2, 1),
                Cell::new(2, 3),
            ]
        );
    }

    #[test]
    fn test_neighbors_skip_walls_and_edges() {
        let grid = Grid::with_blocked(3, 3, &[Cell::new(1, 0)]);
        let neighbors: Vec<Cell> = grid.neighbors4(Cell::new(0, 0)).collect();
        assert_eq!(neighbors, vec![Cell::new(0, 1)]);
    }

    #[test]
    fn test_layout_round_trip() {
        let layout = "□■□\n□■□\n□□□\n";
        let grid = Grid::from_layout(layout).unwrap();
        assert_eq!(grid.rows, 3);
        assert_eq!(grid.cols, 3);
        assert_eq!(grid.blocked_count(), 2);
        assert_eq!(grid.to_layout(), layout);
    }

    #[test]
    fn test_layout_rejects_ragged_rows() {
        assert!(Grid::from_layout("□□□\n□□\n").is_err());
        assert!(Grid::from_layout("\n\n").is_err());
    }

    #[test]
    fn test_filled_grid_has_no_free_cells() {
        let grid = Grid::filled(4, 6);
        assert!(grid.free_cells().is_empty());
        assert_eq!(grid.blocked_count(), 24);
    }

    #[test]
    fn test_cell_distances() {
        let a = Cell::new(0, 0);
        let b = Cell::new(3, 4);
        assert_eq!(a.manhattan(&b), 7);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
