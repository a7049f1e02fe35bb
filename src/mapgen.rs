use crate::agent::Direction;
use crate::error::GenerationError;
use crate::grid::{Cell, Grid, Tile};
use crate::pathfinding::find_path;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

/// Random source for map generation. A fixed seed reproduces the same grid.
pub type MapRng = Pcg64;

pub const DEFAULT_OBSTACLE_DENSITY: f32 = 0.25;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_MAZE_ORIGIN: Cell = Cell::new(1, 1);

/// Carving tries directions in this order before shuffling
const CARVE_ORDER: [Direction; 4] = [
    Direction::Right,
    Direction::Left,
    Direction::Down,
    Direction::Up,
];

/// Which generator builds the episode's grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStrategy {
    /// Random obstacles on an open grid, validated for reachability
    Scatter,
    /// Depth-first backtracker maze on a solid grid
    Maze,
}

/// Dimensions plus the cells a generated grid must keep usable
#[derive(Debug, Clone, PartialEq)]
pub struct MapRequest {
    pub rows: i32,
    pub cols: i32,
    /// Cells that must stay free
    pub protected: Vec<Cell>,
    /// (from, to) pairs that must be connected
    pub reachable_pairs: Vec<(Cell, Cell)>,
}

impl MapRequest {
    pub fn new(rows: i32, cols: i32) -> Self {
        MapRequest {
            rows,
            cols,
            protected: Vec::new(),
            reachable_pairs: Vec::new(),
        }
    }

    pub fn protect(mut self, cell: Cell) -> Self {
        if !self.protected.contains(&cell) {
            self.protected.push(cell);
        }
        self
    }

    pub fn require_path(mut self, from: Cell, to: Cell) -> Self {
        self.reachable_pairs.push((from, to));
        self
    }

    /// Protected cells followed by any pair endpoint not already listed
    pub fn anchors(&self) -> Vec<Cell> {
        let mut anchors = self.protected.clone();
        for &(from, to) in &self.reachable_pairs {
            for cell in [from, to] {
                if !anchors.contains(&cell) {
                    anchors.push(cell);
                }
            }
        }
        anchors
    }

    fn check(&self) -> Result<(), GenerationError> {
        if self.rows <= 0 || self.cols <= 0 {
            return Err(GenerationError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        let bounds = Grid::new(self.rows, self.cols);
        match self.anchors().into_iter().find(|&c| !bounds.in_bounds(c)) {
            Some(cell) => Err(GenerationError::AnchorOutOfBounds(cell)),
            None => Ok(()),
        }
    }

    /// True when every protected cell is free and every required pair is connected
    pub fn is_satisfied_by(&self, grid: &Grid) -> bool {
        self.protected.iter().all(|&cell| grid.is_free(cell))
            && self
                .reachable_pairs
                .iter()
                .all(|&(from, to)| from == to || !find_path(grid, from, to).is_empty())
    }
}

/// A strategy that produces a grid for one episode
pub trait MapGenerator {
    fn generate(&self, request: &MapRequest, rng: &mut MapRng) -> Result<Grid, GenerationError>;
}

/// Scatter obstacles over an open grid and retry until the request is satisfied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterGenerator {
    /// Obstacle placements per cell; 0.25 places rows*cols/4 obstacles
    pub obstacle_density: f32,
    pub max_attempts: u32,
}

impl Default for ScatterGenerator {
    fn default() -> Self {
        ScatterGenerator {
            obstacle_density: DEFAULT_OBSTACLE_DENSITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ScatterGenerator {
    /// Number of random placements per attempt. Placements may repeat a cell.
    pub fn obstacle_quota(&self, rows: i32, cols: i32) -> usize {
        let area = (rows.max(0) * cols.max(0)) as f32;
        (area * self.obstacle_density.max(0.0)).floor() as usize
    }
}

impl MapGenerator for ScatterGenerator {
    fn generate(&self, request: &MapRequest, rng: &mut MapRng) -> Result<Grid, GenerationError> {
        request.check()?;

        let protected: HashSet<Cell> = request.protected.iter().copied().collect();
        let quota = self.obstacle_quota(request.rows, request.cols);

        for attempt in 1..=self.max_attempts {
            let mut grid = Grid::new(request.rows, request.cols);
            for _ in 0..quota {
                let cell = Cell::new(rng.gen_range(0..request.cols), rng.gen_range(0..request.rows));
                if !protected.contains(&cell) {
                    grid.set_tile(cell, Tile::Blocked);
                }
            }

            if request.is_satisfied_by(&grid) {
                debug!(attempt, blocked = grid.blocked_count(), "scatter map accepted");
                return Ok(grid);
            }
            debug!(attempt, "scatter map rejected, anchors unreachable");
        }

        warn!(attempts = self.max_attempts, "scatter generation exhausted");
        Err(GenerationError::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Carve a perfect maze from `origin` with a depth-first backtracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MazeGenerator {
    pub origin: Cell,
}

impl Default for MazeGenerator {
    fn default() -> Self {
        MazeGenerator {
            origin: DEFAULT_MAZE_ORIGIN,
        }
    }
}

/// One level of the carving walk: a cell and its remaining shuffled directions
struct CarveFrame {
    cell: Cell,
    directions: [Direction; 4],
    next: usize,
}

impl CarveFrame {
    fn new(cell: Cell, rng: &mut MapRng) -> Self {
        let mut directions = CARVE_ORDER;
        directions.shuffle(rng);
        CarveFrame {
            cell,
            directions,
            next: 0,
        }
    }
}

impl MazeGenerator {
    /// Clear the origin, then repeatedly jump two cells in a shuffled
    /// direction onto still-blocked cells, clearing the wall in between.
    fn carve(&self, grid: &mut Grid, rng: &mut MapRng) {
        grid.set_tile(self.origin, Tile::Free);
        let mut stack = vec![CarveFrame::new(self.origin, rng)];

        while let Some(frame) = stack.last_mut() {
            if frame.next >= frame.directions.len() {
                stack.pop();
                continue;
            }

            let cell = frame.cell;
            let direction = frame.directions[frame.next];
            frame.next += 1;

            let wall = cell.step(direction);
            let target = wall.step(direction);
            if grid.tile(target) == Some(Tile::Blocked) {
                grid.set_tile(wall, Tile::Free);
                grid.set_tile(target, Tile::Free);
                stack.push(CarveFrame::new(target, rng));
            }
        }
    }
}

/// Open a straight-line-shortest corridor from `anchor` into `region`,
/// adding every opened cell to the region.
fn connect_to_region(grid: &mut Grid, anchor: Cell, region: &mut HashSet<Cell>) {
    if region.contains(&anchor) {
        return;
    }

    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut seen: HashSet<Cell> = HashSet::from([anchor]);
    let mut queue: VecDeque<Cell> = VecDeque::from([anchor]);

    while let Some(cell) = queue.pop_front() {
        if region.contains(&cell) {
            let mut current = cell;
            while let Some(&prev) = came_from.get(&current) {
                grid.set_tile(prev, Tile::Free);
                region.insert(prev);
                current = prev;
            }
            return;
        }

        for direction in [
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ] {
            let next = cell.step(direction);
            if grid.in_bounds(next) && seen.insert(next) {
                came_from.insert(next, cell);
                queue.push_back(next);
            }
        }
    }
}

impl MapGenerator for MazeGenerator {
    fn generate(&self, request: &MapRequest, rng: &mut MapRng) -> Result<Grid, GenerationError> {
        request.check()?;

        let mut grid = Grid::filled(request.rows, request.cols);
        if !grid.in_bounds(self.origin) {
            return Err(GenerationError::AnchorOutOfBounds(self.origin));
        }

        self.carve(&mut grid, rng);

        // Carving only reaches cells with the origin's parity
        let mut region: HashSet<Cell> = grid.free_cells().into_iter().collect();
        for anchor in request.anchors() {
            connect_to_region(&mut grid, anchor, &mut region);
        }

        if request.is_satisfied_by(&grid) {
            debug!(free = region.len(), "maze carved");
            Ok(grid)
        } else {
            warn!("carved maze failed reachability validation");
            Err(GenerationError::Exhausted { attempts: 1 })
        }
    }
}

/// Generation parameters chosen by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSettings {
    pub strategy: MapStrategy,
    pub obstacle_density: f32,
    pub max_attempts: u32,
    pub maze_origin: Cell,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            strategy: MapStrategy::Scatter,
            obstacle_density: DEFAULT_OBSTACLE_DENSITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            maze_origin: DEFAULT_MAZE_ORIGIN,
        }
    }
}

impl MapSettings {
    pub fn generator(&self) -> Box<dyn MapGenerator> {
        match self.strategy {
            MapStrategy::Scatter => Box::new(ScatterGenerator {
                obstacle_density: self.obstacle_density,
                max_attempts: self.max_attempts,
            }),
            MapStrategy::Maze => Box::new(MazeGenerator {
                origin: self.maze_origin,
            }),
        }
    }
}

/// Generate a grid with the configured strategy from a seed
pub fn generate_map(
    settings: &MapSettings,
    request: &MapRequest,
    seed: u64,
) -> Result<Grid, GenerationError> {
    let mut rng = MapRng::seed_from_u64(seed);
    debug!(strategy = ?settings.strategy, seed, rows = request.rows, cols = request.cols, "generating map");
    settings.generator().generate(request, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner_request(rows: i32, cols: i32) -> MapRequest {
        let start = Cell::new(1, 1);
        let exit = Cell::new(cols - 2, rows - 2);
        let left = Cell::new(1, rows - 2);
        let right = Cell::new(cols - 2, 1);
        MapRequest::new(rows, cols)
            .protect(start)
            .protect(exit)
            .protect(left)
            .protect(right)
            .require_path(start, exit)
            .require_path(left, start)
            .require_path(right, start)
    }

    #[test]
    fn test_quota_matches_quarter_of_area() {
        let scatter = ScatterGenerator::default();
        assert_eq!(scatter.obstacle_quota(12, 16), 48);
        let open = ScatterGenerator {
            obstacle_density: 0.0,
            max_attempts: 1,
        };
        assert_eq!(open.obstacle_quota(12, 16), 0);
    }

    #[test]
    fn test_zero_density_is_open_grid() {
        let scatter = ScatterGenerator {
            obstacle_density: 0.0,
            max_attempts: 1,
        };
        let mut rng = MapRng::seed_from_u64(7);
        let grid = scatter.generate(&corner_request(12, 16), &mut rng).unwrap();
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn test_scatter_keeps_protected_cells_free() {
        let request = corner_request(12, 16);
        let mut rng = MapRng::seed_from_u64(42);
        let grid = ScatterGenerator::default().generate(&request, &mut rng).unwrap();
        for cell in &request.protected {
            assert!(grid.is_free(*cell), "protected {} blocked", cell);
        }
        assert!(grid.blocked_count() > 0);
    }

    #[test]
    fn test_impossible_request_is_exhausted() {
        // 15 placements over 5 cells of a single row almost surely wall off the ends
        let request = MapRequest::new(1, 5)
            .protect(Cell::new(0, 0))
            .protect(Cell::new(4, 0))
            .require_path(Cell::new(0, 0), Cell::new(4, 0));
        let scatter = ScatterGenerator {
            obstacle_density: 3.0,
            max_attempts: 5,
        };
        let mut rng = MapRng::seed_from_u64(1);
        assert_eq!(
            scatter.generate(&request, &mut rng),
            Err(GenerationError::Exhausted { attempts: 5 })
        );
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let mut rng = MapRng::seed_from_u64(0);
        assert_eq!(
            ScatterGenerator::default().generate(&MapRequest::new(0, 4), &mut rng),
            Err(GenerationError::InvalidDimensions { rows: 0, cols: 4 })
        );
        let request = MapRequest::new(4, 4).protect(Cell::new(4, 0));
        assert_eq!(
            MazeGenerator::default().generate(&request, &mut rng),
            Err(GenerationError::AnchorOutOfBounds(Cell::new(4, 0)))
        );
    }

    #[test]
    fn test_maze_origin_out_of_bounds() {
        let maze = MazeGenerator {
            origin: Cell::new(9, 9),
        };
        let mut rng = MapRng::seed_from_u64(0);
        assert_eq!(
            maze.generate(&MapRequest::new(5, 5), &mut rng),
            Err(GenerationError::AnchorOutOfBounds(Cell::new(9, 9)))
        );
    }

    #[test]
    fn test_maze_carves_odd_lattice() {
        let mut rng = MapRng::seed_from_u64(3);
        let grid = MazeGenerator::default()
            .generate(&MapRequest::new(11, 11), &mut rng)
            .unwrap();
        // Every odd/odd cell is a room of the perfect maze
        for row in (1..11).step_by(2) {
            for col in (1..11).step_by(2) {
                assert!(grid.is_free(Cell::new(col, row)));
            }
        }
        // Even/even cells are never carved
        assert!(grid.is_blocked(Cell::new(0, 0)));
        assert!(grid.is_blocked(Cell::new(2, 2)));
    }

    #[test]
    fn test_maze_patches_off_lattice_anchor() {
        // (14, 10) has even coordinates and is never reached by carving from (1, 1)
        let request = corner_request(12, 16);
        let mut rng = MapRng::seed_from_u64(11);
        let grid = MazeGenerator::default().generate(&request, &mut rng).unwrap();
        assert!(grid.is_free(Cell::new(14, 10)));
        assert!(request.is_satisfied_by(&grid));
    }

    #[test]
    fn test_same_seed_same_grid() {
        let request = corner_request(12, 16);
        for strategy in [MapStrategy::Scatter, MapStrategy::Maze] {
            let settings = MapSettings {
                strategy,
                ..MapSettings::default()
            };
            let a = generate_map(&settings, &request, 99).unwrap();
            let b = generate_map(&settings, &request, 99).unwrap();
            assert_eq!(a, b);
        }
    }
}
