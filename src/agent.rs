use crate::grid::{Cell, Grid};
use crate::pathfinding::find_path;
use serde::{Deserialize, Serialize};

/// Facing and movement direction on the 4-connected grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Column/row offset of one step; rows grow downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Direction implied by the coordinate delta between two cells.
    /// The dominant axis wins; `None` when the cells are equal.
    pub fn between(from: Cell, to: Cell) -> Option<Direction> {
        let dc = to.col - from.col;
        let dr = to.row - from.row;
        if dc == 0 && dr == 0 {
            None
        } else if dc.abs() >= dr.abs() {
            Some(if dc < 0 { Direction::Left } else { Direction::Right })
        } else {
            Some(if dr < 0 { Direction::Up } else { Direction::Down })
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// What drives an agent's movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Moved by directional intent from the presentation layer
    Player,
    /// Chases the player along a fresh shortest path
    Pursuer,
    /// Heads for the shared goal along a fresh shortest path
    Racer,
}

/// Frame-counted move delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    /// Ticks to wait between moves
    pub delay: u32,
    /// Ticks elapsed since the last reset
    pub counter: u32,
}

impl Cadence {
    pub fn new(delay: u32) -> Self {
        Cadence { delay, counter: 0 }
    }

    /// Count one tick. Returns true when the delay has been satisfied.
    pub fn advance(&mut self) -> bool {
        self.counter = self.counter.saturating_add(1);
        self.is_ready()
    }

    pub fn is_ready(&self) -> bool {
        self.counter >= self.delay
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// A grid-bound mover owned by an episode
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: usize,
    pub role: Role,
    pub position: Cell,
    pub facing: Direction,
    pub cadence: Cadence,
}

impl Agent {
    /// Create an agent facing down with a fresh cadence
    pub fn new(id: usize, role: Role, position: Cell, delay: u32) -> Self {
        Agent {
            id,
            role,
            position,
            facing: Direction::Down,
            cadence: Cadence::new(delay),
        }
    }

    /// Advance the player by one tick of directional intent.
    ///
    /// The cadence counter only resets on a successful move, so pushing
    /// into a wall keeps the player ready to move on the next tick.
    /// Returns true if the player moved.
    pub fn step_player(&mut self, grid: &Grid, intent: Option<Direction>) -> bool {
        if !self.cadence.advance() {
            return false;
        }

        let Some(direction) = intent else {
            return false;
        };

        let destination = self.position.step(direction);
        if !grid.is_free(destination) {
            return false;
        }

        self.position = destination;
        self.facing = direction;
        self.cadence.reset();
        true
    }

    /// Advance a path-following agent by one tick toward `target`.
    ///
    /// When the cadence fires it always resets, then the agent moves to the
    /// first cell of a freshly computed path. An empty path means staying put.
    /// Returns true if the agent moved.
    pub fn step_toward(&mut self, grid: &Grid, target: Cell) -> bool {
        if !self.cadence.advance() {
            return false;
        }
        self.cadence.reset();

        let path = find_path(grid, self.position, target);
        match path.first() {
            Some(&next) => {
                if let Some(direction) = Direction::between(self.position, next) {
                    self.facing = direction;
                }
                self.position = next;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_fires_after_delay() {
        let mut cadence = Cadence::new(3);
        assert!(!cadence.advance());
        assert!(!cadence.advance());
        assert!(cadence.advance());
        cadence.reset();
        assert_eq!(cadence.counter, 0);
        assert!(!cadence.advance());
    }

    #[test]
    fn test_zero_delay_fires_every_tick() {
        let mut cadence = Cadence::new(0);
        assert!(cadence.advance());
        assert!(cadence.advance());
    }

    #[test]
    fn test_direction_between() {
        let origin = Cell::new(5, 5);
        assert_eq!(Direction::between(origin, Cell::new(4, 5)), Some(Direction::Left));
        assert_eq!(Direction::between(origin, Cell::new(6, 5)), Some(Direction::Right));
        assert_eq!(Direction::between(origin, Cell::new(5, 4)), Some(Direction::Up));
        assert_eq!(Direction::between(origin, Cell::new(5, 6)), Some(Direction::Down));
        assert_eq!(Direction::between(origin, origin), None);
    }

    #[test]
    fn test_opposite_round_trips() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let (dc, dr) = dir.delta();
            let (oc, or) = dir.opposite().delta();
            assert_eq!((dc + oc, dr + or), (0, 0));
        }
    }

    #[test]
    fn test_player_moves_and_faces() {
        let grid = Grid::new(5, 5);
        let mut player = Agent::new(0, Role::Player, Cell::new(2, 2), 1);

        assert!(player.step_player(&grid, Some(Direction::Left)));
        assert_eq!(player.position, Cell::new(1, 2));
        assert_eq!(player.facing, Direction::Left);
        assert_eq!(player.cadence.counter, 0);
    }

    #[test]
    fn test_player_without_intent_keeps_counting() {
        let grid = Grid::new(5, 5);
        let mut player = Agent::new(0, Role::Player, Cell::new(2, 2), 2);

        assert!(!player.step_player(&grid, None));
        assert!(!player.step_player(&grid, None));
        assert!(!player.step_player(&grid, None));
        assert_eq!(player.cadence.counter, 3);

        // Still ready, so the next intent moves immediately
        assert!(player.step_player(&grid, Some(Direction::Up)));
        assert_eq!(player.position, Cell::new(2, 1));
    }

    #[test]
    fn test_pursuer_steps_along_path() {
        let grid = Grid::new(5, 5);
        let mut pursuer = Agent::new(1, Role::Pursuer, Cell::new(0, 0), 2);

        assert!(!pursuer.step_toward(&grid, Cell::new(0, 3)));
        assert!(pursuer.step_toward(&grid, Cell::new(0, 3)));
        assert_eq!(pursuer.position, Cell::new(0, 1));
        assert_eq!(pursuer.facing, Direction::Down);
        assert_eq!(pursuer.cadence.counter, 0);
    }

    #[test]
    fn test_pursuer_on_target_keeps_facing() {
        let grid = Grid::new(3, 3);
        let mut pursuer = Agent::new(1, Role::Pursuer, Cell::new(1, 1), 1);
        pursuer.facing = Direction::Left;

        assert!(!pursuer.step_toward(&grid, Cell::new(1, 1)));
        assert_eq!(pursuer.position, Cell::new(1, 1));
        assert_eq!(pursuer.facing, Direction::Left);
        assert_eq!(pursuer.cadence.counter, 0);
    }

    #[test]
    fn test_boxed_in_pursuer_stays_put() {
        let grid = Grid::with_blocked(3, 3, &[Cell::new(1, 0), Cell::new(0, 1)]);
        let mut pursuer = Agent::new(1, Role::Pursuer, Cell::new(0, 0), 1);

        assert!(!pursuer.step_toward(&grid, Cell::new(2, 2)));
        assert_eq!(pursuer.position, Cell::new(0, 0));
    }
}
